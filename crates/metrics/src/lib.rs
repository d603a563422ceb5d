//! Metrics collection and export for the buran backend.
//!
//! Every crate records through the `metrics` facade re-exported here, using
//! the names in [`definitions`]. With the `prometheus` feature the recorder
//! renders Prometheus text for the gateway's `/metrics` route; without it all
//! recordings are discarded.
//!
//! ```rust,ignore
//! use buran_metrics::{counter, chat};
//!
//! counter!(chat::VISITOR_MESSAGES_TOTAL).increment(1);
//! ```

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{MetricsHandle, MetricsRecorderConfig, init_metrics},
};

pub use metrics::{counter, gauge, histogram};
