//! Response envelope and the not-found sentinel.
//!
//! Every response produced by this layer (not-found, auth failure, gated docs,
//! unconfigured handlers) shares one JSON shape:
//!
//! ```text
//! { "code": 404, "message": "the route not found", "data": null }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Message carried by the not-found sentinel.
pub const ROUTE_NOT_FOUND: &str = "the route not found";

/// JSON envelope shared by every response this layer produces.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
}

impl ApiResponse<()> {
    /// Envelope with no payload.
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
            data: None,
        }
    }
}

/// Build an error response with the shared envelope.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::message(status, message))).into_response()
}

/// The not-found sentinel.
///
/// Registered both as router fallback and as the method fallback of every
/// path, so an unknown path and an unsupported method on a known path are
/// indistinguishable to the caller.
pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, ROUTE_NOT_FOUND)
}
