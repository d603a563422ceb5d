//! Operator relay: sends messages into the operator chat.

use std::{future::Future, time::Duration};

use {
    async_trait::async_trait,
    teloxide::{
        RequestError,
        payloads::SendMessageSetters,
        prelude::*,
        types::{MessageId, ParseMode, Recipient, ReplyParameters},
    },
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use buran_metrics::{counter, histogram, labels, telegram as tg_metrics};

use buran_channels::{OperatorMessage, OperatorOutbound, SendOutcome};

use crate::{config::parse_recipient, state::SharedCorrelator};

const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

/// Sends visitor messages and notifications to the operator chat.
///
/// Never returns an error: missing configuration and delivery failures are
/// reported as [`SendOutcome`] values.
pub struct TelegramRelay {
    bot: Option<Bot>,
    operator_chat: Option<Recipient>,
    correlator: SharedCorrelator,
}

impl TelegramRelay {
    /// `bot` is `None` when no token is configured; every send is then
    /// [`SendOutcome::NotConfigured`].
    pub fn new(bot: Option<Bot>, operator_chat: &str, correlator: SharedCorrelator) -> Self {
        Self {
            bot,
            operator_chat: parse_recipient(operator_chat),
            correlator,
        }
    }

    async fn send_with_fallback(
        &self,
        bot: &Bot,
        to: Recipient,
        text: &str,
        reply_params: Option<ReplyParameters>,
    ) -> Result<MessageId, RequestError> {
        let html = run_with_retry("send message (html)", || {
            let mut req = bot
                .send_message(to.clone(), text)
                .parse_mode(ParseMode::Html);
            if let Some(rp) = &reply_params {
                req = req.reply_parameters(rp.clone());
            }
            async move { req.await }
        })
        .await;

        match html {
            Ok(message) => Ok(message.id),
            Err(e) if is_parse_entities_error(&e) => {
                warn!(chat = ?to, error = %e, "telegram rejected HTML, retrying as plain text");
                let message = run_with_retry("send message (plain)", || {
                    let mut req = bot.send_message(to.clone(), text);
                    if let Some(rp) = &reply_params {
                        req = req.reply_parameters(rp.clone());
                    }
                    async move { req.await }
                })
                .await?;
                Ok(message.id)
            },
            Err(e) => Err(e),
        }
    }

    fn remember(&self, message_id: i64, user_id: &str) {
        let mut correlator = self.correlator.lock().unwrap_or_else(|e| e.into_inner());
        correlator.remember(message_id, user_id);
        #[cfg(feature = "metrics")]
        buran_metrics::gauge!(tg_metrics::CORRELATION_ENTRIES).set(correlator.len() as f64);
    }
}

#[async_trait]
impl OperatorOutbound for TelegramRelay {
    async fn send(&self, message: &OperatorMessage) -> SendOutcome {
        if message.text.trim().is_empty() {
            return SendOutcome::failed("empty message body");
        }
        let Some(bot) = &self.bot else {
            debug!("telegram not configured, relay skipped");
            return SendOutcome::NotConfigured;
        };
        let to = match message.chat_id.as_deref() {
            Some(chat) => parse_recipient(chat),
            None => self.operator_chat.clone(),
        };
        let Some(to) = to else {
            debug!("no operator chat configured, relay skipped");
            return SendOutcome::NotConfigured;
        };

        let reply_params = message
            .reply_to
            .and_then(|id| i32::try_from(id).ok())
            .map(|id| ReplyParameters::new(MessageId(id)).allow_sending_without_reply());

        #[cfg(feature = "metrics")]
        let start = std::time::Instant::now();

        let result = self
            .send_with_fallback(bot, to.clone(), &message.text, reply_params)
            .await;

        #[cfg(feature = "metrics")]
        histogram!(tg_metrics::MESSAGE_SEND_DURATION_SECONDS).record(start.elapsed().as_secs_f64());

        match result {
            Ok(id) => {
                let message_id = i64::from(id.0);
                info!(
                    chat = ?to,
                    message_id,
                    conversation = ?message.conversation,
                    "telegram message sent"
                );
                #[cfg(feature = "metrics")]
                counter!(tg_metrics::MESSAGES_SENT_TOTAL).increment(1);
                if let Some(user_id) = &message.conversation {
                    self.remember(message_id, user_id);
                }
                SendOutcome::Sent { message_id }
            },
            Err(e) => {
                warn!(chat = ?to, error = %e, "telegram send failed");
                #[cfg(feature = "metrics")]
                counter!(
                    tg_metrics::MESSAGE_SEND_ERRORS_TOTAL,
                    labels::ERROR_TYPE => error_type(&e)
                )
                .increment(1);
                SendOutcome::failed(e)
            },
        }
    }
}

async fn run_with_retry<T, F, Fut>(
    operation: &'static str,
    mut request: F,
) -> Result<T, RequestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RequestError>>,
{
    let mut retries = 0usize;

    loop {
        match request().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let Some(wait) = retry_after_duration(&err) else {
                    return Err(err);
                };

                if retries >= TELEGRAM_RETRY_AFTER_MAX_RETRIES {
                    warn!(
                        operation,
                        retries,
                        max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limit persisted after retries"
                    );
                    return Err(err);
                }

                retries += 1;
                warn!(
                    operation,
                    retries,
                    max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                    retry_after_secs = wait.as_secs(),
                    "telegram rate limited, waiting before retry"
                );
                tokio::time::sleep(wait).await;
            },
        }
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

fn is_parse_entities_error(error: &RequestError) -> bool {
    matches!(error, RequestError::Api(api) if api.to_string().contains("can't parse entities"))
}

#[cfg(feature = "metrics")]
fn error_type(error: &RequestError) -> &'static str {
    match error {
        RequestError::Api(_) => "api",
        RequestError::RetryAfter(_) => "rate_limited",
        _ => "transport",
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{correlator::ReplyCorrelator, state::shared_correlator},
        axum::{Json, Router, body::Bytes, extract::State, http::Uri, routing::post},
        serde::Deserialize,
        serde_json::{Value, json},
        std::sync::{Arc, Mutex},
        teloxide::ApiError,
    };

    #[derive(Debug, Clone, Deserialize)]
    struct SendMessageRequest {
        chat_id: Value,
        text: String,
        #[serde(default)]
        parse_mode: Option<String>,
        #[serde(default)]
        reply_parameters: Option<Value>,
    }

    /// Scripted responses, consumed in order; once exhausted every call succeeds.
    #[derive(Clone, Default)]
    struct MockTelegramApi {
        requests: Arc<Mutex<Vec<SendMessageRequest>>>,
        script: Arc<Mutex<Vec<Value>>>,
    }

    async fn telegram_api_handler(
        State(state): State<MockTelegramApi>,
        uri: Uri,
        body: Bytes,
    ) -> Json<Value> {
        assert!(uri.path().ends_with("/SendMessage"), "unexpected call {uri}");
        let req: SendMessageRequest = serde_json::from_slice(&body).unwrap();
        state.requests.lock().unwrap().push(req);

        let scripted = {
            let mut script = state.script.lock().unwrap();
            (!script.is_empty()).then(|| script.remove(0))
        };
        Json(scripted.unwrap_or_else(|| {
            let id = state.requests.lock().unwrap().len() as i64 + 100;
            json!({
                "ok": true,
                "result": {
                    "message_id": id,
                    "date": 0,
                    "chat": { "id": -1001, "type": "supergroup", "title": "operators" },
                    "text": "ok"
                }
            })
        }))
    }

    async fn spawn_mock(api: MockTelegramApi) -> Bot {
        let app = Router::new()
            .route("/{*path}", post(telegram_api_handler))
            .with_state(api);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let api_url = reqwest::Url::parse(&format!("http://{addr}/")).unwrap();
        Bot::new("test-token").set_api_url(api_url)
    }

    #[tokio::test]
    async fn unconfigured_relay_makes_no_call() {
        let relay = TelegramRelay::new(
            None,
            "-1001",
            shared_correlator(ReplyCorrelator::default()),
        );
        let outcome = relay.send(&OperatorMessage::new("hello")).await;
        assert_eq!(outcome, SendOutcome::NotConfigured);
    }

    #[tokio::test]
    async fn empty_body_fails_without_network() {
        let api = MockTelegramApi::default();
        let bot = spawn_mock(api.clone()).await;
        let relay = TelegramRelay::new(
            Some(bot),
            "-1001",
            shared_correlator(ReplyCorrelator::default()),
        );
        let outcome = relay.send(&OperatorMessage::new("  ")).await;
        assert!(matches!(outcome, SendOutcome::Failed { .. }));
        assert!(api.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn visitor_relay_sends_html_and_remembers_conversation() {
        let api = MockTelegramApi::default();
        let bot = spawn_mock(api.clone()).await;
        let correlator = shared_correlator(ReplyCorrelator::default());
        let relay = TelegramRelay::new(Some(bot), "-1001", correlator.clone());

        let outcome = relay
            .send(&OperatorMessage::new("<b>hi</b>").for_conversation("abc123"))
            .await;
        assert_eq!(outcome, SendOutcome::Sent { message_id: 101 });

        let requests = api.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].chat_id, json!(-1001));
        assert_eq!(requests[0].parse_mode.as_deref(), Some("HTML"));
        assert!(requests[0].reply_parameters.is_none());
        assert_eq!(
            correlator.lock().unwrap().resolve(101).as_deref(),
            Some("abc123")
        );
    }

    #[tokio::test]
    async fn reply_to_sets_reply_parameters() {
        let api = MockTelegramApi::default();
        let bot = spawn_mock(api.clone()).await;
        let relay = TelegramRelay::new(
            Some(bot),
            "@buran_ops",
            shared_correlator(ReplyCorrelator::default()),
        );
        relay
            .send(&OperatorMessage::new("threaded").reply_to(77))
            .await;

        let requests = api.requests.lock().unwrap();
        assert_eq!(requests[0].chat_id, json!("@buran_ops"));
        assert_eq!(requests[0].reply_parameters.as_ref().unwrap()["message_id"], 77);
    }

    #[tokio::test]
    async fn html_rejection_falls_back_to_plain_text() {
        let api = MockTelegramApi::default();
        api.script.lock().unwrap().push(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: can't parse entities: Unsupported start tag \"x\" at byte offset 0"
        }));
        let bot = spawn_mock(api.clone()).await;
        let relay = TelegramRelay::new(
            Some(bot),
            "-1001",
            shared_correlator(ReplyCorrelator::default()),
        );

        let outcome = relay.send(&OperatorMessage::new("<x>broken")).await;
        assert!(outcome.is_sent());

        let requests = api.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].parse_mode.as_deref(), Some("HTML"));
        assert_eq!(requests[1].parse_mode, None);
    }

    #[tokio::test]
    async fn provider_failure_is_an_outcome() {
        let api = MockTelegramApi::default();
        api.script.lock().unwrap().push(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        }));
        let bot = spawn_mock(api.clone()).await;
        let correlator = shared_correlator(ReplyCorrelator::default());
        let relay = TelegramRelay::new(Some(bot), "-1001", correlator.clone());

        let outcome = relay
            .send(&OperatorMessage::new("hello").for_conversation("abc123"))
            .await;
        assert!(matches!(outcome, SendOutcome::Failed { .. }));
        assert_eq!(api.requests.lock().unwrap().len(), 1);
        assert!(correlator.lock().unwrap().is_empty());
    }

    #[test]
    fn retry_after_duration_extracts_wait() {
        let err = RequestError::RetryAfter(teloxide::types::Seconds::from_seconds(42));
        assert_eq!(retry_after_duration(&err), Some(Duration::from_secs(42)));
    }

    #[test]
    fn retry_after_duration_ignores_other_errors() {
        let err = RequestError::Io(std::io::Error::other("boom"));
        assert_eq!(retry_after_duration(&err), None);
    }

    #[test]
    fn parse_entities_detection_ignores_other_api_errors() {
        assert!(!is_parse_entities_error(&RequestError::Api(
            ApiError::ChatNotFound
        )));
    }
}
