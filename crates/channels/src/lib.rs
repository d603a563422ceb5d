//! Seams to the outside world: the operator channel, the spreadsheet
//! webhook, and the inbound reply poll.
//!
//! Request handlers never talk to the network themselves. They hand an
//! [`OutboundTask`] to the [`OutboundDispatcher`], whose single worker
//! performs it through the [`OperatorOutbound`] / [`SpreadsheetSink`]
//! implementations and reports every outcome as an [`OutboundEvent`].

pub mod dispatch;
pub mod error;
pub mod inbound;
pub mod outbound;

pub use {
    dispatch::{OutboundDispatcher, OutboundEvent, OutboundTask, TaskKind},
    error::{Error, Result},
    inbound::{InboundPoll, PollError},
    outbound::{
        OperatorMessage, OperatorOutbound, SendOutcome, SheetRow, SpreadsheetSink, Unconfigured,
    },
};
