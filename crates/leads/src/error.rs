use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A required form field was missing or blank.
    #[error("{field} is required")]
    MissingField { field: &'static str },

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

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::MissingField { .. })
    }
}

impl buran_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::message(message)
    }
}

buran_common::impl_context!();

pub type Result<T> = std::result::Result<T, Error>;
