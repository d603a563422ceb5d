use std::sync::Arc;

use {
    buran_auto_reply::{AutoReplies, OperatorInfo, QuickReplies},
    buran_channels::{InboundPoll, OperatorMessage, OutboundDispatcher, OutboundTask},
    buran_common::{Page, PageRequest},
    buran_messages::{ChatMessage, ConversationSummary, MessageStore, NewMessage},
    buran_telegram::visitor_envelope,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use buran_metrics::{chat as chat_metrics, counter};

use crate::{Error, Result};

/// Most messages returned by one `get`.
pub const GET_LIMIT: u32 = 50;

/// Outcome of a visitor `send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResult {
    /// The stored visitor message.
    pub message: ChatMessage,
    /// Canned answer, when the text matched a quick reply.
    pub auto_response: Option<String>,
}

/// Chat operations for the website widget and the admin panel.
#[derive(Clone)]
pub struct ChatBridge {
    store: Arc<dyn MessageStore>,
    replies: AutoReplies,
    dispatcher: OutboundDispatcher,
    poller: Option<Arc<dyn InboundPoll>>,
}

impl ChatBridge {
    /// `poller` is `None` when Telegram is not configured; `get` then only
    /// reads the store.
    pub fn new(
        store: Arc<dyn MessageStore>,
        replies: AutoReplies,
        dispatcher: OutboundDispatcher,
        poller: Option<Arc<dyn InboundPoll>>,
    ) -> Self {
        Self {
            store,
            replies,
            dispatcher,
            poller,
        }
    }

    /// Store a visitor message, relay it to the operator, and answer with a
    /// canned reply when the text is an exact quick-reply trigger.
    ///
    /// Relay problems never fail the call.
    pub async fn send(&self, user_id: &str, text: &str) -> Result<SendResult> {
        if user_id.trim().is_empty() {
            return Err(Error::validation("userId is required"));
        }
        if text.trim().is_empty() {
            return Err(Error::validation("Message is required"));
        }

        let message = self.store.append(NewMessage::visitor(user_id, text)).await?;
        #[cfg(feature = "metrics")]
        counter!(chat_metrics::VISITOR_MESSAGES_TOTAL).increment(1);

        let relay = OperatorMessage::new(visitor_envelope(user_id, text)).for_conversation(user_id);
        if let Err(e) = self.dispatcher.enqueue(OutboundTask::Operator(relay)) {
            warn!(user_id, message_id = message.id, error = %e, "visitor message not relayed");
        }

        let auto_response = self.replies.reply_for(text).await?;
        if let Some(answer) = &auto_response {
            self.store
                .append(NewMessage::operator(user_id, answer.as_str()))
                .await?;
            #[cfg(feature = "metrics")]
            counter!(chat_metrics::AUTO_REPLIES_TOTAL).increment(1);
        }

        debug!(
            user_id,
            message_id = message.id,
            auto_reply = auto_response.is_some(),
            "visitor message accepted"
        );
        Ok(SendResult {
            message,
            auto_response,
        })
    }

    /// Messages after `last_id`, then one poll cycle so operator replies
    /// reach the store. Replies fetched here show up on the next `get`.
    pub async fn get(&self, user_id: &str, last_id: i64) -> Result<Vec<ChatMessage>> {
        if user_id.trim().is_empty() {
            return Err(Error::validation("userId is required"));
        }
        let messages = self
            .store
            .list_since(user_id, last_id.max(0), GET_LIMIT)
            .await?;

        if let Some(poller) = &self.poller
            && let Err(e) = poller.poll_now().await
        {
            warn!(user_id, error = %e, "reply poll failed during get");
        }

        Ok(messages)
    }

    pub async fn mark_read(&self, message_id: i64) -> Result<bool> {
        Ok(self.store.mark_read(message_id).await?)
    }

    pub async fn quick_replies(&self) -> Result<QuickReplies> {
        Ok(self.replies.quick_replies().await?)
    }

    pub async fn operator_info(&self) -> Result<OperatorInfo> {
        Ok(self.replies.operator_info().await?)
    }

    pub async fn set_quick_replies(&self, table: &QuickReplies) -> Result<()> {
        self.replies.set_quick_replies(table).await?;
        info!(count = table.len(), "quick replies updated");
        Ok(())
    }

    pub async fn set_operator_info(&self, info: &OperatorInfo) -> Result<()> {
        self.replies.set_operator_info(info).await?;
        info!(name = %info.name, "operator info updated");
        Ok(())
    }

    // ── Admin panel ─────────────────────────────────────────────────────────

    pub async fn conversations(&self) -> Result<Vec<ConversationSummary>> {
        Ok(self.store.conversations().await?)
    }

    /// One page of a conversation. Opening it marks the visitor's messages
    /// read; the returned page still shows their previous state.
    pub async fn history(&self, user_id: &str, page: PageRequest) -> Result<Page<ChatMessage>> {
        let page = self.store.history(user_id, page).await?;
        let marked = self.store.mark_user_messages_read(user_id).await?;
        if marked > 0 {
            debug!(user_id, marked, "visitor messages marked read");
        }
        Ok(page)
    }

    /// Operator answer typed in the admin panel. Stored already read.
    pub async fn admin_reply(&self, user_id: &str, text: &str) -> Result<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::validation("Message is required"));
        }
        if user_id.trim().is_empty() {
            return Err(Error::validation("userId is required"));
        }
        let message = self
            .store
            .append(NewMessage::operator(user_id, text).read())
            .await?;
        #[cfg(feature = "metrics")]
        counter!(chat_metrics::ADMIN_REPLIES_TOTAL).increment(1);
        info!(user_id, message_id = message.id, "admin reply stored");
        Ok(message)
    }

    pub async fn delete_conversation(&self, user_id: &str) -> Result<u64> {
        let deleted = self.store.delete_conversation(user_id).await?;
        #[cfg(feature = "metrics")]
        counter!(chat_metrics::CONVERSATIONS_DELETED_TOTAL).increment(1);
        info!(user_id, deleted, "conversation deleted");
        Ok(deleted)
    }

    pub async fn unread_count(&self) -> Result<i64> {
        Ok(self.store.unread_count().await?)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        async_trait::async_trait,
        buran_channels::{
            OperatorOutbound, OutboundEvent, PollError, SendOutcome, TaskKind, Unconfigured,
        },
        buran_messages::SqliteMessageStore,
        buran_settings::SettingsStore,
        std::{
            sync::{
                Mutex,
                atomic::{AtomicUsize, Ordering},
            },
            time::Duration,
        },
        tokio_util::sync::CancellationToken,
    };

    #[derive(Default)]
    struct RecordingOperator {
        sent: Mutex<Vec<OperatorMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl OperatorOutbound for RecordingOperator {
        async fn send(&self, message: &OperatorMessage) -> SendOutcome {
            self.sent.lock().unwrap().push(message.clone());
            if self.fail {
                SendOutcome::failed("Bad Request: chat not found")
            } else {
                SendOutcome::Sent { message_id: 555 }
            }
        }
    }

    struct CountingPoller {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl InboundPoll for CountingPoller {
        async fn poll_now(&self) -> std::result::Result<usize, PollError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err("getUpdates: connection refused".into())
            } else {
                Ok(0)
            }
        }
    }

    struct Harness {
        bridge: ChatBridge,
        operator: Arc<RecordingOperator>,
        events: tokio::sync::broadcast::Receiver<OutboundEvent>,
    }

    async fn harness(operator: RecordingOperator, poller: Option<Arc<dyn InboundPoll>>) -> Harness {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        buran_messages::run_migrations(&pool).await.unwrap();
        buran_settings::run_migrations(&pool).await.unwrap();

        let operator = Arc::new(operator);
        let (dispatcher, _worker) = OutboundDispatcher::spawn(
            16,
            operator.clone(),
            Arc::new(Unconfigured),
            CancellationToken::new(),
        );
        let events = dispatcher.subscribe();
        let bridge = ChatBridge::new(
            Arc::new(SqliteMessageStore::with_pool(pool.clone())),
            AutoReplies::new(SettingsStore::new(pool)),
            dispatcher,
            poller,
        );
        Harness {
            bridge,
            operator,
            events,
        }
    }

    async fn next_outcome(h: &mut Harness) -> SendOutcome {
        let event = tokio::time::timeout(Duration::from_secs(2), h.events.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            OutboundEvent::Completed { kind, outcome, .. } => {
                assert_eq!(kind, TaskKind::Operator);
                outcome
            },
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn quick_reply_trigger_stores_and_returns_canned_answer() {
        let mut h = harness(RecordingOperator::default(), None).await;

        let result = h.bridge.send("abc123", "Konsultatsiya olish").await.unwrap();
        assert_eq!(
            result.auto_response.as_deref(),
            Some("Konsultatsiya olish uchun quyidagi formani to'ldiring")
        );
        assert!(result.message.is_user);

        let msgs = h.bridge.get("abc123", 0).await.unwrap();
        assert_eq!(msgs.len(), 2);
        assert!(msgs[0].is_user);
        assert!(!msgs[1].is_user);
        assert_eq!(msgs[1].text, result.auto_response.unwrap());

        assert_eq!(next_outcome(&mut h).await, SendOutcome::Sent { message_id: 555 });
        let sent = h.operator.sent.lock().unwrap();
        assert_eq!(sent[0].conversation.as_deref(), Some("abc123"));
        assert!(sent[0].text.contains("<b>Foydalanuvchi:</b> abc123"));
        assert!(sent[0].text.ends_with("Konsultatsiya olish"));
    }

    #[tokio::test]
    async fn near_miss_trigger_gets_no_auto_reply() {
        let h = harness(RecordingOperator::default(), None).await;
        let result = h
            .bridge
            .send("u1", "aloqa ma'lumotlari ")
            .await
            .unwrap();
        assert!(result.auto_response.is_none());
        assert_eq!(h.bridge.get("u1", 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn relay_failure_does_not_fail_send() {
        let mut h = harness(
            RecordingOperator {
                fail: true,
                ..Default::default()
            },
            None,
        )
        .await;

        let result = h.bridge.send("u1", "Salom").await.unwrap();
        assert!(result.message.id > 0);
        assert!(matches!(next_outcome(&mut h).await, SendOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn empty_message_is_rejected_before_anything_happens() {
        let h = harness(RecordingOperator::default(), None).await;
        let err = h.bridge.send("u1", "   ").await.unwrap_err();
        assert!(err.is_client_error());
        assert!(h.bridge.get("u1", 0).await.unwrap().is_empty());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(h.operator.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_polls_and_survives_poll_failure() {
        let poller = Arc::new(CountingPoller {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let h = harness(RecordingOperator::default(), Some(poller.clone())).await;
        let first = h.bridge.send("u1", "one").await.unwrap();
        h.bridge.send("u1", "two").await.unwrap();

        let newer = h.bridge.get("u1", first.message.id).await.unwrap();
        assert_eq!(newer.len(), 1);
        assert_eq!(newer[0].text, "two");
        assert_eq!(poller.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn admin_reply_is_trimmed_and_read() {
        let h = harness(RecordingOperator::default(), None).await;
        let reply = h.bridge.admin_reply("u1", "  Javob  ").await.unwrap();
        assert_eq!(reply.text, "Javob");
        assert!(reply.is_read);
        assert!(!reply.is_user);

        let err = h.bridge.admin_reply("u1", " ").await.unwrap_err();
        assert_eq!(err.to_string(), "Message is required");
    }

    #[tokio::test]
    async fn history_marks_visitor_messages_read() {
        let h = harness(RecordingOperator::default(), None).await;
        h.bridge.send("u1", "a").await.unwrap();
        h.bridge.send("u1", "b").await.unwrap();
        assert_eq!(h.bridge.unread_count().await.unwrap(), 2);

        let page = h.bridge.history("u1", PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|m| !m.is_read));
        assert_eq!(h.bridge.unread_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_conversation_only_touches_one_visitor() {
        let h = harness(RecordingOperator::default(), None).await;
        h.bridge.send("u1", "a").await.unwrap();
        h.bridge.send("u2", "b").await.unwrap();

        assert_eq!(h.bridge.delete_conversation("u1").await.unwrap(), 1);
        let convs = h.bridge.conversations().await.unwrap();
        assert_eq!(convs.len(), 1);
        assert_eq!(convs[0].user_id, "u2");
    }

    #[tokio::test]
    async fn edited_quick_replies_take_effect() {
        let h = harness(RecordingOperator::default(), None).await;
        h.bridge
            .set_quick_replies(&QuickReplies::from_pairs([("Narx", "Bepul konsultatsiya")]))
            .await
            .unwrap();
        let result = h.bridge.send("u1", "Narx").await.unwrap();
        assert_eq!(result.auto_response.as_deref(), Some("Bepul konsultatsiya"));
        assert_eq!(h.bridge.operator_info().await.unwrap(), OperatorInfo::default());
    }
}
