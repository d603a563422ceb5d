use async_trait::async_trait;

/// Error returned by an inbound poll cycle.
pub type PollError = Box<dyn std::error::Error + Send + Sync>;

/// Pulls operator replies from the messaging provider into the message store.
#[async_trait]
pub trait InboundPoll: Send + Sync {
    /// Run one cycle now. Waits for an in-flight cycle instead of running
    /// concurrently with it. Returns how many messages were stored.
    async fn poll_now(&self) -> Result<usize, PollError>;
}
