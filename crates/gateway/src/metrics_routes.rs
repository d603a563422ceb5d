//! Prometheus scrape endpoint.

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::state::AppState;

/// Returns metrics in Prometheus text exposition format.
///
/// Unauthenticated so scrapers can reach it. 503 when metrics are disabled
/// in config or the binary was built without the `metrics` feature.
pub async fn prometheus_metrics_handler(State(state): State<AppState>) -> Response {
    match render(&state) {
        Some(body) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain")],
            "Metrics not enabled",
        )
            .into_response(),
    }
}

#[cfg(feature = "metrics")]
fn render(state: &AppState) -> Option<String> {
    state.metrics_handle.as_ref().map(|h| h.render())
}

#[cfg(not(feature = "metrics"))]
fn render(_state: &AppState) -> Option<String> {
    None
}
