use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("message text is empty")]
    EmptyText,

    #[error("user id is empty")]
    EmptyUserId,

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    /// Whether the error was caused by caller input rather than storage.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptyText | Self::EmptyUserId)
    }
}

impl buran_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::message(message)
    }
}

buran_common::impl_context!();

pub type Result<T> = std::result::Result<T, Error>;
