//! HTTP request metrics middleware.
//!
//! Records request counts, durations and in-flight requests for every route.

use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};

use buran_metrics::{counter, gauge, histogram, http as http_metrics, labels};

/// Path segments that are followed by a visitor id.
const ID_PARENTS: &[&str] = &["history", "reply", "conversation"];

/// Middleware that collects HTTP request metrics.
///
/// This records:
/// - `buran_http_requests_total`: Counter of total requests by endpoint, method, and status
/// - `buran_http_request_duration_seconds`: Histogram of request durations
/// - `buran_http_requests_in_flight`: Gauge of currently processing requests
pub async fn http_metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let endpoint = normalize_path(request.uri().path());

    gauge!(http_metrics::REQUESTS_IN_FLIGHT, labels::ENDPOINT => endpoint.clone(), labels::METHOD => method.clone())
        .increment(1.0);

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    let duration = start.elapsed().as_secs_f64();

    counter!(
        http_metrics::REQUESTS_TOTAL,
        labels::ENDPOINT => endpoint.clone(),
        labels::METHOD => method.clone(),
        labels::STATUS => status.clone()
    )
    .increment(1);

    histogram!(
        http_metrics::REQUEST_DURATION_SECONDS,
        labels::ENDPOINT => endpoint.clone(),
        labels::METHOD => method.clone(),
        labels::STATUS => status
    )
    .record(duration);

    gauge!(http_metrics::REQUESTS_IN_FLIGHT, labels::ENDPOINT => endpoint, labels::METHOD => method)
        .decrement(1.0);

    response
}

/// Normalize a URL path for metric labels.
///
/// Visitor ids and numeric ids become `{id}` to keep label cardinality bounded.
fn normalize_path(path: &str) -> String {
    let mut previous = "";
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| {
            let is_dynamic = ID_PARENTS.contains(&previous)
                || segment.chars().all(|c| c.is_ascii_digit());
            previous = segment;
            if is_dynamic { "{id}" } else { segment }
        })
        .collect();

    format!("/{}", segments.join("/"))
}
