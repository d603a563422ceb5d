//! Canned replies for the website chat widget.
//!
//! The widget offers a few quick-reply buttons; when a visitor sends exactly
//! one of those texts the backend answers immediately with the matching canned
//! text. The table and the operator card shown above the chat are editable
//! from the admin panel and persisted in the settings store.

pub mod catalog;
pub mod error;
pub mod operator;
pub mod quick_replies;

pub use {
    catalog::AutoReplies,
    error::{Error, Result},
    operator::OperatorInfo,
    quick_replies::QuickReplies,
};
