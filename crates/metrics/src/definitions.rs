//! Metric name and label definitions.
//!
//! All metric names used by the workspace live here so the `/metrics` output
//! stays consistent across crates.

/// HTTP request metrics
pub mod http {
    /// Total number of HTTP requests handled
    pub const REQUESTS_TOTAL: &str = "buran_http_requests_total";
    /// Duration of HTTP requests in seconds
    pub const REQUEST_DURATION_SECONDS: &str = "buran_http_request_duration_seconds";
    /// Requests currently being processed
    pub const REQUESTS_IN_FLIGHT: &str = "buran_http_requests_in_flight";
}

/// Website chat metrics
pub mod chat {
    /// Messages written by website visitors
    pub const VISITOR_MESSAGES_TOTAL: &str = "buran_chat_visitor_messages_total";
    /// Canned replies returned inline
    pub const AUTO_REPLIES_TOTAL: &str = "buran_chat_auto_replies_total";
    /// Operator replies written from the admin panel
    pub const ADMIN_REPLIES_TOTAL: &str = "buran_chat_admin_replies_total";
    /// Conversations deleted from the admin panel
    pub const CONVERSATIONS_DELETED_TOTAL: &str = "buran_chat_conversations_deleted_total";
}

/// Telegram relay and poller metrics
pub mod telegram {
    /// Messages sent to Telegram
    pub const MESSAGES_SENT_TOTAL: &str = "buran_telegram_messages_sent_total";
    /// Message send errors by type
    pub const MESSAGE_SEND_ERRORS_TOTAL: &str = "buran_telegram_message_send_errors_total";
    /// Message send duration in seconds
    pub const MESSAGE_SEND_DURATION_SECONDS: &str = "buran_telegram_message_send_duration_seconds";
    /// Completed poll cycles
    pub const POLL_CYCLES_TOTAL: &str = "buran_telegram_poll_cycles_total";
    /// Failed poll cycles (cursor not advanced)
    pub const POLL_ERRORS_TOTAL: &str = "buran_telegram_poll_errors_total";
    /// Scheduled ticks skipped because a cycle was still in flight
    pub const POLL_SKIPPED_TOTAL: &str = "buran_telegram_poll_skipped_total";
    /// Update polling duration
    pub const POLL_DURATION_SECONDS: &str = "buran_telegram_poll_duration_seconds";
    /// Updates processed past the cursor
    pub const UPDATES_PROCESSED_TOTAL: &str = "buran_telegram_updates_processed_total";
    /// Operator replies attributed to a conversation
    pub const REPLIES_CORRELATED_TOTAL: &str = "buran_telegram_replies_correlated_total";
    /// Operator replies dropped because the replied-to message was unknown
    pub const REPLIES_UNMATCHED_TOTAL: &str = "buran_telegram_replies_unmatched_total";
    /// Entries currently held by the reply correlator
    pub const CORRELATION_ENTRIES: &str = "buran_telegram_correlation_entries";
}

/// Outbound dispatcher metrics
pub mod outbound {
    /// Tasks accepted into the queue
    pub const TASKS_ENQUEUED_TOTAL: &str = "buran_outbound_tasks_enqueued_total";
    /// Tasks rejected because the queue was full or closed
    pub const TASKS_DROPPED_TOTAL: &str = "buran_outbound_tasks_dropped_total";
    /// Finished tasks, labelled by kind and outcome
    pub const TASKS_COMPLETED_TOTAL: &str = "buran_outbound_tasks_completed_total";
}

/// Lead intake metrics
pub mod leads {
    /// Applications submitted through the website form
    pub const SUBMITTED_TOTAL: &str = "buran_leads_submitted_total";
}

/// Common label keys
pub mod labels {
    pub const ENDPOINT: &str = "endpoint";
    pub const METHOD: &str = "method";
    pub const STATUS: &str = "status";
    pub const KIND: &str = "kind";
    pub const OUTCOME: &str = "outcome";
    pub const ERROR_TYPE: &str = "error_type";
    pub const FORM_TYPE: &str = "form_type";
}

/// Standard histogram buckets
pub mod buckets {
    use once_cell::sync::Lazy;

    /// HTTP and bot API call durations (seconds), 1ms to 60s
    pub static HTTP_DURATION: Lazy<Vec<f64>> = Lazy::new(|| {
        vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
        ]
    });
}
