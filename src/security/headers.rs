//! Cache-control normalization and security response headers.
//!
//! # Responsibilities
//! - Mark every response as non-cacheable (first stage of the chain)
//! - Add security response headers, including on error and not-found
//!   responses
//!
//! # Design Decisions
//! - Headers override whatever a handler or file server set
//! - HSTS is opt-in; it is only meaningful behind a TLS terminator

use axum::{
    extract::{Request, State},
    http::{
        header::{
            CACHE_CONTROL, EXPIRES, STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS, X_XSS_PROTECTION,
        },
        HeaderValue,
    },
    middleware::Next,
    response::Response,
};
use tower::{layer::util::{Identity, Stack}, ServiceBuilder};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::SecurityConfig;

pub const NO_CACHE: &str = "no-cache, no-store, max-age=0, must-revalidate";
pub const EPOCH: &str = "Thu, 01 Jan 1970 00:00:00 GMT";
const HSTS_VALUE: &str = "max-age=31536000";

pub type NoCacheLayer = ServiceBuilder<
    Stack<
        SetResponseHeaderLayer<HeaderValue>,
        Stack<SetResponseHeaderLayer<HeaderValue>, Identity>,
    >,
>;

/// Cache-control stage.
pub fn no_cache_layer() -> NoCacheLayer {
    ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(NO_CACHE),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            EXPIRES,
            HeaderValue::from_static(EPOCH),
        ))
}

/// Policy for the security-headers stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureHeaders {
    pub hsts: bool,
}

impl From<&SecurityConfig> for SecureHeaders {
    fn from(config: &SecurityConfig) -> Self {
        Self { hsts: config.hsts }
    }
}

/// Security-headers stage.
pub async fn secure_headers(
    State(policy): State<SecureHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
    if policy.hsts {
        headers.insert(STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS_VALUE));
    }

    response
}
