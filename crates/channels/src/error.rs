/// Crate-wide result type for dispatcher operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a task could not be handed to the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The queue is at capacity.
    #[error("outbound queue is full ({capacity} pending)")]
    QueueFull { capacity: usize },

    /// The worker has stopped.
    #[error("outbound dispatcher is shut down")]
    Closed,
}

impl Error {
    /// Short label for logs and metrics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::QueueFull { .. } => "queue_full",
            Self::Closed => "closed",
        }
    }
}
