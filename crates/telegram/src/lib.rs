//! Telegram side of the chat bridge.
//!
//! Visitor messages go out to the operator chat through [`TelegramRelay`];
//! operator replies come back through [`InboundPoller`], which uses the
//! [`ReplyCorrelator`] to find the visitor each reply belongs to.

pub mod bot;
pub mod config;
pub mod correlator;
pub mod envelope;
pub mod error;
pub mod outbound;
pub mod poller;
pub mod state;

pub use {
    bot::{connect, spawn_polling},
    config::{build_bot, numeric_chat_id, parse_recipient},
    correlator::ReplyCorrelator,
    envelope::{extract_conversation_marker, visitor_envelope},
    error::{Error, Result},
    outbound::TelegramRelay,
    poller::{InboundMessage, InboundPoller, InboundUpdate, PollReport, poll_once, process_updates},
    state::{PollerState, SharedCorrelator, shared_correlator},
};
