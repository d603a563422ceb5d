//! Website-facing chat actions.
//!
//! [`ChatBridge`] ties the message store, the canned-reply table, the
//! outbound dispatcher and the reply poller together behind the operations
//! the chat widget and the admin panel call.

pub mod bridge;
pub mod error;

pub use {
    bridge::{ChatBridge, GET_LIMIT, SendResult},
    error::{Error, Result},
};
