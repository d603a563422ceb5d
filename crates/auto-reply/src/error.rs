use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Settings(#[from] buran_settings::Error),

    #[error("quick reply {trigger:?} has an empty answer")]
    EmptyAnswer { trigger: String },

    #[error("quick reply trigger is empty")]
    EmptyTrigger,
}

pub type Result<T> = std::result::Result<T, Error>;
