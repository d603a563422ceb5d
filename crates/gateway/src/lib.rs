//! Gateway: the HTTP surface of the backend.
//!
//! Lifecycle:
//! 1. Load + validate config
//! 2. Open the SQLite pool and run every crate's migrations
//! 3. Wire stores, the outbound dispatcher, the Telegram relay and poller
//! 4. Serve the chat, admin, lead, health and metrics routes
//! 5. On shutdown, stop polling and drain the outbound queue
//!
//! Domain logic lives in `buran-chat`, `buran-leads` and `buran-telegram`;
//! handlers here only translate HTTP to those calls and back.

pub mod auth_middleware;
pub mod chat_routes;
pub mod db;
pub mod dto;
pub mod error;
pub mod lead_routes;
#[cfg(feature = "metrics")]
pub mod metrics_middleware;
pub mod metrics_routes;
pub mod server;
pub mod services;
pub mod state;

pub use {
    error::ApiError,
    server::{build_app, start_gateway},
    services::Services,
    state::AppState,
};
