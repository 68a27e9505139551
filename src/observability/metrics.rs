//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, route, status
//! - `http_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - The route label is the matched pattern, never the raw path, so dynamic
//!   segments (user IDs, asset names) cannot explode label cardinality
//! - Unmatched requests are bucketed as `/*`
//! - Without an installed recorder every call is a no-op

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics_exporter_prometheus::PrometheusBuilder;

const UNMATCHED_ROUTE: &str = "/*";
const STATIC_ROUTE: &str = "/static";

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Metrics stage.
pub async fn track_request(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = route_label(request.extensions().get::<MatchedPath>());

    let response = next.run(request).await;
    record_request(&method, &route, response.status().as_u16(), start);
    response
}

fn route_label(matched: Option<&MatchedPath>) -> String {
    match matched.map(MatchedPath::as_str) {
        Some(path) if path.starts_with(STATIC_ROUTE) => STATIC_ROUTE.to_string(),
        Some(path) => path.to_string(),
        None => UNMATCHED_ROUTE.to_string(),
    }
}
