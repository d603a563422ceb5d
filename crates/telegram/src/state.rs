use std::sync::{Arc, Mutex};

use crate::correlator::ReplyCorrelator;

/// Correlator shared by the relay (writes on send) and the poller (reads and
/// writes while processing updates). A std mutex: never held across `.await`.
pub type SharedCorrelator = Arc<Mutex<ReplyCorrelator>>;

pub fn shared_correlator(correlator: ReplyCorrelator) -> SharedCorrelator {
    Arc::new(Mutex::new(correlator))
}

/// Poll cursor plus the correlator it feeds. Lives for the process lifetime;
/// nothing here is persisted.
pub struct PollerState {
    /// Highest update id processed so far. Never decreases.
    pub last_update_id: i64,
    pub correlator: SharedCorrelator,
}

impl PollerState {
    pub fn new(correlator: SharedCorrelator) -> Self {
        Self {
            last_update_id: 0,
            correlator,
        }
    }

    /// `offset` for the next getUpdates call.
    pub fn next_offset(&self) -> i32 {
        i32::try_from(self.last_update_id.saturating_add(1)).unwrap_or(i32::MAX)
    }
}
