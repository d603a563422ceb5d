use std::{sync::Arc, time::Instant};

use {
    buran_chat::ChatBridge,
    buran_leads::LeadIntake,
    secrecy::{ExposeSecret, Secret},
};

#[cfg(feature = "metrics")]
use buran_metrics::MetricsHandle;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub chat: ChatBridge,
    pub leads: LeadIntake,
    /// Bearer token for admin routes; `None` leaves them open.
    pub admin_token: Option<Arc<Secret<String>>>,
    pub version: &'static str,
    pub started_at: Instant,
    #[cfg(feature = "metrics")]
    pub metrics_handle: Option<MetricsHandle>,
}

impl AppState {
    pub fn new(chat: ChatBridge, leads: LeadIntake) -> Self {
        Self {
            chat,
            leads,
            admin_token: None,
            version: env!("CARGO_PKG_VERSION"),
            started_at: Instant::now(),
            #[cfg(feature = "metrics")]
            metrics_handle: None,
        }
    }

    #[must_use]
    pub fn with_admin_token(mut self, token: Option<Secret<String>>) -> Self {
        self.admin_token = token
            .filter(|t| !t.expose_secret().trim().is_empty())
            .map(Arc::new);
        self
    }

    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn with_metrics(mut self, handle: Option<MetricsHandle>) -> Self {
        self.metrics_handle = handle;
        self
    }
}
