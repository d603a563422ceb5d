use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Rejected before anything was stored or sent.
    #[error("{message}")]
    Validation { message: String },

    #[error(transparent)]
    Store(#[from] buran_messages::Error),

    #[error(transparent)]
    Settings(#[from] buran_auto_reply::Error),
}

impl Error {
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether the caller sent bad input (HTTP 400) rather than the backend
    /// failing (HTTP 500).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Validation { .. } => true,
            Self::Store(e) => e.is_validation(),
            Self::Settings(e) => !matches!(e, buran_auto_reply::Error::Settings(_)),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
