//! CORS and OPTIONS handling.
//!
//! Preflight requests (carrying `Access-Control-Request-Method`) are
//! answered by the CORS layer. Any other `OPTIONS` request is answered by
//! [`answer_options`], which sits in front of the CORS layer, with `200` and
//! an `Allow` header. Neither kind reaches routing.

use std::time::Duration;

use axum::{
    extract::Request,
    http::{
        header::{
            ACCEPT, ACCESS_CONTROL_REQUEST_METHOD, ALLOW, AUTHORIZATION, CONTENT_TYPE, ORIGIN,
        },
        HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::SecurityConfig;
use crate::http::request::X_REQUEST_ID;

pub const ALLOWED_METHODS: &str = "HEAD,GET,POST,PUT,PATCH,DELETE,OPTIONS";

/// Build the CORS layer from the configured origin list.
pub fn cors_layer(config: &SecurityConfig) -> CorsLayer {
    let origins = &config.cors_allow_origins;
    let allow_origin = if origins.is_empty() || origins.iter().any(|o| o.trim() == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o.trim()).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, ORIGIN, CONTENT_TYPE, ACCEPT])
        .expose_headers([X_REQUEST_ID])
        .max_age(Duration::from_secs(86_400))
}

/// Short-circuit plain `OPTIONS` requests; preflights pass through.
pub async fn answer_options(request: Request, next: Next) -> Response {
    if request.method() != Method::OPTIONS
        || request.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD)
    {
        return next.run(request).await;
    }

    (
        StatusCode::OK,
        [(ALLOW, HeaderValue::from_static(ALLOWED_METHODS))],
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware::from_fn, routing::get, Router};
    use tower::{ServiceBuilder, ServiceExt};

    fn app(config: &SecurityConfig) -> Router {
        Router::new().route("/ping", get(|| async { "pong" })).layer(
            ServiceBuilder::new()
                .layer(from_fn(answer_options))
                .layer(cors_layer(config)),
        )
    }

    #[tokio::test]
    async fn test_plain_options_answered_with_allow() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/ping")
            .body(Body::empty())
            .unwrap();
        let response = app(&SecurityConfig::default()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[ALLOW], ALLOWED_METHODS);
    }

    #[tokio::test]
    async fn test_preflight_handled_by_cors() {
        let config = SecurityConfig {
            cors_allow_origins: vec!["https://app.example.com".into()],
            ..SecurityConfig::default()
        };
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/ping")
            .header(ORIGIN, "https://app.example.com")
            .header(ACCESS_CONTROL_REQUEST_METHOD, "PUT")
            .body(Body::empty())
            .unwrap();
        let response = app(&config).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "https://app.example.com"
        );
        assert!(!response.headers().contains_key(ALLOW));
    }
}
