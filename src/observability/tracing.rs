//! Request spans.
//!
//! The tracing stage opens one span per request. It runs below the
//! request-ID stage, so the ID is already in the extensions and is recorded
//! on the span.

use axum::{body::Body, http::Request};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

use crate::http::request::RequestIdExt;

pub type RequestTraceLayer =
    TraceLayer<SharedClassifier<ServerErrorsAsFailures>, fn(&Request<Body>) -> Span>;

/// Tracing stage layer.
pub fn trace_layer() -> RequestTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(make_span as fn(&Request<Body>) -> Span)
        .on_response(DefaultOnResponse::new().level(Level::DEBUG))
}

fn make_span(req: &Request<Body>) -> Span {
    let request_id = req
        .request_id()
        .map(|id| id.as_str().to_owned())
        .unwrap_or_default();

    tracing::info_span!(
        "request",
        method = %req.method(),
        uri = %req.uri(),
        request_id = %request_id,
    )
}
