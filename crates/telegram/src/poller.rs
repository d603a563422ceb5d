//! Inbound poller: pulls operator replies out of getUpdates.
//!
//! Each cycle fetches updates past the cursor, stores operator replies that
//! can be attributed to a visitor, and advances the cursor. Cycles are
//! serialized through the mutex around [`PollerState`].

use std::sync::Arc;

use {
    async_trait::async_trait,
    serde::Serialize,
    teloxide::{
        prelude::*,
        types::{Update, UpdateKind},
    },
    tracing::{debug, error},
};

#[cfg(feature = "metrics")]
use buran_metrics::{counter, gauge, histogram, telegram as tg_metrics};

use {
    buran_channels::{InboundPoll, PollError},
    buran_messages::{MessageStore, NewMessage},
};

use crate::{Result, envelope::extract_conversation_marker, state::PollerState};

/// The parts of a Telegram message the poller reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub message_id: i64,
    pub chat_id: i64,
    pub text: Option<String>,
    /// Id of the message this one replies to.
    pub reply_to: Option<i64>,
}

/// A getUpdates entry reduced to what the poller needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundUpdate {
    pub update_id: i64,
    /// `None` for update kinds the poller ignores.
    pub message: Option<InboundMessage>,
}

impl From<&Update> for InboundUpdate {
    fn from(update: &Update) -> Self {
        // as_offset() is id + 1.
        let update_id = i64::from(update.id.as_offset()) - 1;
        let message = match &update.kind {
            UpdateKind::Message(msg) | UpdateKind::ChannelPost(msg) => Some(InboundMessage {
                message_id: i64::from(msg.id.0),
                chat_id: msg.chat.id.0,
                text: msg.text().map(str::to_owned),
                reply_to: msg.reply_to_message().map(|r| i64::from(r.id.0)),
            }),
            _ => None,
        };
        Self { update_id, message }
    }
}

/// Counters for one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PollReport {
    /// Updates returned by the provider.
    pub fetched: usize,
    /// Updates past the cursor.
    pub processed: usize,
    /// Operator replies stored for a visitor.
    pub correlated: usize,
    /// Replies to messages the correlator does not know.
    pub unmatched: usize,
    /// Marker lines remembered.
    pub markers: usize,
    /// Updates whose processing failed (cursor still advanced past them).
    pub failed: usize,
    /// Cursor after the cycle.
    pub cursor: i64,
}

/// Fetch-and-process loop body with its own state.
pub struct InboundPoller {
    bot: Bot,
    operator_chat: Option<i64>,
    limit: u8,
    store: Arc<dyn MessageStore>,
    state: tokio::sync::Mutex<PollerState>,
}

impl InboundPoller {
    /// `operator_chat` restricts which chat replies are accepted from; `None`
    /// accepts replies from any chat the bot is in.
    pub fn new(
        bot: Bot,
        operator_chat: Option<i64>,
        limit: u8,
        store: Arc<dyn MessageStore>,
        state: PollerState,
    ) -> Self {
        Self {
            bot,
            operator_chat,
            limit: limit.clamp(1, 100),
            store,
            state: tokio::sync::Mutex::new(state),
        }
    }

    /// Run a cycle, waiting for any in-flight cycle to finish first.
    pub async fn poll(&self) -> Result<PollReport> {
        let mut state = self.state.lock().await;
        self.cycle(&mut state).await
    }

    /// Run a cycle unless one is already running. `None` means skipped.
    pub async fn poll_if_idle(&self) -> Option<Result<PollReport>> {
        let Ok(mut state) = self.state.try_lock() else {
            #[cfg(feature = "metrics")]
            counter!(tg_metrics::POLL_SKIPPED_TOTAL).increment(1);
            return None;
        };
        Some(self.cycle(&mut state).await)
    }

    /// Current cursor. Waits for an in-flight cycle.
    pub async fn cursor(&self) -> i64 {
        self.state.lock().await.last_update_id
    }

    async fn cycle(&self, state: &mut PollerState) -> Result<PollReport> {
        #[cfg(feature = "metrics")]
        let start = std::time::Instant::now();

        let result = poll_once(
            &self.bot,
            self.limit,
            self.operator_chat,
            self.store.as_ref(),
            state,
        )
        .await;

        #[cfg(feature = "metrics")]
        {
            histogram!(tg_metrics::POLL_DURATION_SECONDS).record(start.elapsed().as_secs_f64());
            match &result {
                Ok(_) => counter!(tg_metrics::POLL_CYCLES_TOTAL).increment(1),
                Err(_) => counter!(tg_metrics::POLL_ERRORS_TOTAL).increment(1),
            }
        }

        result
    }
}

#[async_trait]
impl InboundPoll for InboundPoller {
    async fn poll_now(&self) -> std::result::Result<usize, PollError> {
        let report = self.poll().await?;
        Ok(report.correlated)
    }
}

/// One getUpdates round trip plus processing.
///
/// A fetch failure returns an error and leaves the cursor untouched.
pub async fn poll_once(
    bot: &Bot,
    limit: u8,
    operator_chat: Option<i64>,
    store: &dyn MessageStore,
    state: &mut PollerState,
) -> Result<PollReport> {
    let updates = bot
        .get_updates()
        .offset(state.next_offset())
        .limit(limit)
        .timeout(0)
        .await?;

    let updates: Vec<InboundUpdate> = updates.iter().map(InboundUpdate::from).collect();
    if !updates.is_empty() {
        debug!(count = updates.len(), cursor = state.last_update_id, "got telegram updates");
    }
    Ok(process_updates(updates, operator_chat, store, state).await)
}

/// Apply fetched updates to the store and correlator and advance the cursor.
///
/// Updates at or below the cursor are skipped, so replaying a batch is a
/// no-op. The cursor moves to the highest id seen even when an individual
/// update fails.
pub async fn process_updates(
    mut updates: Vec<InboundUpdate>,
    operator_chat: Option<i64>,
    store: &dyn MessageStore,
    state: &mut PollerState,
) -> PollReport {
    let mut report = PollReport {
        fetched: updates.len(),
        ..Default::default()
    };
    updates.sort_by_key(|u| u.update_id);

    for update in updates {
        if update.update_id <= state.last_update_id {
            continue;
        }
        report.processed += 1;

        if let Some(message) = &update.message
            && let Err(e) = process_message(message, operator_chat, store, state, &mut report).await
        {
            report.failed += 1;
            error!(
                update_id = update.update_id,
                error = %e,
                "failed to store operator reply"
            );
        }

        state.last_update_id = update.update_id;
    }

    report.cursor = state.last_update_id;

    #[cfg(feature = "metrics")]
    {
        counter!(tg_metrics::UPDATES_PROCESSED_TOTAL).increment(report.processed as u64);
        counter!(tg_metrics::REPLIES_CORRELATED_TOTAL).increment(report.correlated as u64);
        counter!(tg_metrics::REPLIES_UNMATCHED_TOTAL).increment(report.unmatched as u64);
        let entries = state
            .correlator
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len();
        gauge!(tg_metrics::CORRELATION_ENTRIES).set(entries as f64);
    }

    report
}

async fn process_message(
    message: &InboundMessage,
    operator_chat: Option<i64>,
    store: &dyn MessageStore,
    state: &PollerState,
    report: &mut PollReport,
) -> buran_messages::Result<()> {
    let Some(text) = message.text.as_deref() else {
        return Ok(());
    };

    // Markers are remembered from any chat the bot can see.
    if let Some(user_id) = extract_conversation_marker(text) {
        state
            .correlator
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remember(message.message_id, user_id);
        report.markers += 1;
    }

    let Some(reply_to) = message.reply_to else {
        return Ok(());
    };
    if operator_chat.is_some_and(|chat| chat != message.chat_id) {
        debug!(chat_id = message.chat_id, "ignoring reply outside the operator chat");
        return Ok(());
    }
    let user_id = state
        .correlator
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .resolve(reply_to);

    match user_id {
        Some(user_id) => {
            store
                .append(NewMessage::operator(&user_id, text).with_provider_id(message.message_id))
                .await?;
            report.correlated += 1;
            debug!(user_id, message_id = message.message_id, "operator reply stored");
        },
        None => {
            report.unmatched += 1;
            debug!(reply_to, "reply to unknown message, dropped");
        },
    }
    Ok(())
}
