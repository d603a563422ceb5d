//! Shared types, the error context helper, and utilities used across all buran crates.

pub mod error;
pub mod text;
pub mod types;

pub use {
    error::FromMessage,
    text::escape_html,
    types::{Page, PageRequest, now_ms},
};
