//! Spreadsheet webhook client.

use std::time::Duration;

use {
    async_trait::async_trait,
    buran_channels::{SendOutcome, SheetRow, SpreadsheetSink},
    tracing::debug,
};

use crate::{Result, error::Context};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Posts each row as JSON to a webhook (typically an Apps Script deployment).
///
/// Without a URL every row reports [`SendOutcome::NotConfigured`].
pub struct SheetsClient {
    client: reqwest::Client,
    url: Option<String>,
}

impl SheetsClient {
    pub fn new(url: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build spreadsheet webhook client")?;
        let url = url.filter(|u| !u.trim().is_empty());
        Ok(Self { client, url })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}

#[async_trait]
impl SpreadsheetSink for SheetsClient {
    async fn append_row(&self, row: &SheetRow) -> SendOutcome {
        let Some(url) = &self.url else {
            return SendOutcome::NotConfigured;
        };

        match self.client.post(url).json(row).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(status = %resp.status(), "spreadsheet row appended");
                SendOutcome::Sent { message_id: 0 }
            },
            Ok(resp) => SendOutcome::failed(format!("webhook returned HTTP {}", resp.status())),
            Err(e) => SendOutcome::failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        axum::{Json, Router, http::StatusCode, routing::post},
        std::sync::{Arc, Mutex},
    };

    fn row() -> SheetRow {
        SheetRow {
            name: "Aziz".into(),
            phone: "+998".into(),
            country: String::new(),
            form_type: "Website Form".into(),
            timestamp: "01.03.2026, 12:00:00".into(),
        }
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/exec")
    }

    #[tokio::test]
    async fn no_url_is_not_configured() {
        let client = SheetsClient::new(Some("  ".into())).unwrap();
        assert!(!client.is_configured());
        assert_eq!(client.append_row(&row()).await, SendOutcome::NotConfigured);
    }

    #[tokio::test]
    async fn posts_camel_case_json() {
        let seen = Arc::new(Mutex::new(Vec::<serde_json::Value>::new()));
        let captured = seen.clone();
        let url = serve(Router::new().route(
            "/exec",
            post(move |Json(body): Json<serde_json::Value>| {
                let captured = captured.clone();
                async move {
                    captured.lock().unwrap().push(body);
                    "ok"
                }
            }),
        ))
        .await;

        let client = SheetsClient::new(Some(url)).unwrap();
        assert!(client.append_row(&row()).await.is_sent());

        let body = seen.lock().unwrap()[0].clone();
        assert_eq!(body["formType"], "Website Form");
        assert_eq!(body["timestamp"], "01.03.2026, 12:00:00");
    }

    #[tokio::test]
    async fn http_error_is_a_failed_outcome() {
        let url = serve(Router::new().route(
            "/exec",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        ))
        .await;
        let client = SheetsClient::new(Some(url)).unwrap();
        match client.append_row(&row()).await {
            SendOutcome::Failed { reason } => assert!(reason.contains("500")),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
