//! End-to-end routing tests against the compiled router.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
};
use tower::ServiceExt;

use user_gateway::config::RunMode;
use user_gateway::http::{middleware_fn, RequestIdExt, ROUTE_NOT_FOUND, X_REQUEST_ID};
use user_gateway::routing::Collaborators;
use user_gateway::HttpServer;

mod common;

use common::{authorized, config, json_body, request, server, server_with, ToggleEnv};

#[tokio::test]
async fn test_public_routes_reach_handlers() {
    let server = server(config(RunMode::Debug), Arc::new(ToggleEnv::default()));

    for (method, path, endpoint) in [
        (Method::POST, "/v1/register", "register"),
        (Method::POST, "/v1/login", "login"),
        (Method::POST, "/v1/login/phone", "phone_login"),
        (Method::GET, "/v1/vcode", "verification_code"),
    ] {
        let response = server.router().oneshot(request(method, path)).await.unwrap();
        let (status, body) = json_body(response).await;
        assert_eq!(status, StatusCode::OK, "{path}");
        assert_eq!(body["endpoint"], endpoint, "{path}");
    }
}

#[tokio::test]
async fn test_profile_read_is_public() {
    let server = server(config(RunMode::Release), Arc::new(ToggleEnv::default()));

    let response = server
        .router()
        .oneshot(request(Method::GET, "/v1/users/42"))
        .await
        .unwrap();
    let (status, body) = json_body(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoint"], "get_user");
    assert!(body["user_id"].is_null());
}

#[tokio::test]
async fn test_users_group_requires_token() {
    let server = server(config(RunMode::Release), Arc::new(ToggleEnv::default()));

    for (method, path) in [
        (Method::PUT, "/v1/users/42"),
        (Method::POST, "/v1/users/follow"),
        (Method::GET, "/v1/users/42/following"),
        (Method::GET, "/v1/users/42/followers"),
    ] {
        let response = server
            .router()
            .oneshot(request(method.clone(), path))
            .await
            .unwrap();
        let (status, body) = json_body(response).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {path}");
        assert_eq!(body["code"], 401);

        let response = server
            .router()
            .oneshot(authorized(method.clone(), path, 42))
            .await
            .unwrap();
        let (status, body) = json_body(response).await;
        assert_eq!(status, StatusCode::OK, "{method} {path}");
        assert_eq!(body["user_id"], 42);
    }
}

#[tokio::test]
async fn test_invalid_token_rejected() {
    let server = server(config(RunMode::Debug), Arc::new(ToggleEnv::default()));

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/v1/users/1")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_route_and_wrong_method_look_the_same() {
    let server = server(config(RunMode::Debug), Arc::new(ToggleEnv::default()));

    let unknown = server
        .router()
        .oneshot(request(Method::GET, "/v1/nonexistent"))
        .await
        .unwrap();
    let wrong_method = server
        .router()
        .oneshot(request(Method::DELETE, "/v1/register"))
        .await
        .unwrap();

    let (unknown_status, unknown_body) = json_body(unknown).await;
    let (wrong_status, wrong_body) = json_body(wrong_method).await;
    assert_eq!(unknown_status, StatusCode::NOT_FOUND);
    assert_eq!(wrong_status, StatusCode::NOT_FOUND);
    assert_eq!(unknown_body, wrong_body);
    assert_eq!(unknown_body["message"], ROUTE_NOT_FOUND);
}

#[tokio::test]
async fn test_chain_headers_on_every_response() {
    let server = server(config(RunMode::Debug), Arc::new(ToggleEnv::default()));

    for path in ["/v1/vcode", "/v1/nonexistent"] {
        let response = server
            .router()
            .oneshot(request(Method::GET, path))
            .await
            .unwrap();
        let headers = response.headers();
        assert!(
            headers[header::CACHE_CONTROL]
                .to_str()
                .unwrap()
                .contains("no-store"),
            "{path}"
        );
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY", "{path}");
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff", "{path}");
        assert!(headers.contains_key(X_REQUEST_ID), "{path}");
    }
}

#[tokio::test]
async fn test_incoming_request_id_is_echoed() {
    let server = server(config(RunMode::Debug), Arc::new(ToggleEnv::default()));

    let request = Request::builder()
        .uri("/v1/vcode")
        .header(X_REQUEST_ID, "trace-me-123")
        .body(Body::empty())
        .unwrap();
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.headers()[X_REQUEST_ID], "trace-me-123");

    let (_, body) = json_body(response).await;
    assert_eq!(body["request_id"], "trace-me-123");
}

#[tokio::test]
async fn test_custom_units_run_after_core_chain() {
    let saw_request_id = Arc::new(AtomicBool::new(false));
    let flag = saw_request_id.clone();
    let unit = middleware_fn("probe", move |request: Request, next: Next| {
        let flag = flag.clone();
        async move {
            flag.store(request.request_id().is_some(), Ordering::SeqCst);
            let mut response = next.run(request).await;
            response
                .headers_mut()
                .insert("x-probe", HeaderValue::from_static("seen"));
            response
        }
    });

    let server = server_with(
        config(RunMode::Debug),
        Arc::new(ToggleEnv::default()),
        vec![unit],
    );
    let response = server
        .router()
        .oneshot(request(Method::GET, "/v1/vcode"))
        .await
        .unwrap();

    assert_eq!(response.headers()["x-probe"], "seen");
    assert!(saw_request_id.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_options_answered_before_routing() {
    let server = server(config(RunMode::Debug), Arc::new(ToggleEnv::default()));

    for path in ["/v1/login", "/v1/nonexistent"] {
        let response = server
            .router()
            .oneshot(request(Method::OPTIONS, path))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert!(response.headers().contains_key(header::ALLOW), "{path}");
    }
}

#[tokio::test]
async fn test_stage_positions_visible_on_responses() {
    let server = server(config(RunMode::Debug), Arc::new(ToggleEnv::default()));

    // A plain OPTIONS is answered at the cors stage: the no-cache stage
    // above it still runs, the stages below it never do.
    let response = server
        .router()
        .oneshot(request(Method::OPTIONS, "/v1/login"))
        .await
        .unwrap();
    let headers = response.headers();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(headers.contains_key(header::CACHE_CONTROL));
    assert!(headers.contains_key(header::EXPIRES));
    assert!(!headers.contains_key(header::X_FRAME_OPTIONS));
    assert!(!headers.contains_key(X_REQUEST_ID));

    let response = server
        .router()
        .oneshot(request(Method::GET, "/v1/vcode"))
        .await
        .unwrap();
    let headers = response.headers();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(headers.contains_key(header::CACHE_CONTROL));
    assert!(headers.contains_key(header::X_FRAME_OPTIONS));
    assert!(headers.contains_key(X_REQUEST_ID));
}

#[tokio::test]
async fn test_debug_mode_serves_tooling() {
    let server = server(config(RunMode::Debug), Arc::new(ToggleEnv::default()));

    let response = server
        .router()
        .oneshot(request(Method::GET, "/swagger/doc.json"))
        .await
        .unwrap();
    let (status, body) = json_body(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "users-test");
    assert!(body["routes"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["path"] == "/v1/users/{id}/followers" && r["auth"] == "required"));

    let response = server
        .router()
        .oneshot(request(Method::GET, "/debug/pprof/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = server
        .router()
        .oneshot(request(Method::GET, "/debug/pprof/build"))
        .await
        .unwrap();
    let (status, body) = json_body(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "debug");
}

#[tokio::test]
async fn test_release_mode_hides_profiling() {
    let server = server(config(RunMode::Release), Arc::new(ToggleEnv::default()));

    for path in ["/debug/pprof/", "/debug/pprof/runtime"] {
        let response = server
            .router()
            .oneshot(request(Method::GET, path))
            .await
            .unwrap();
        let (status, body) = json_body(response).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
        assert_eq!(body["message"], ROUTE_NOT_FOUND, "{path}");
    }
}

#[tokio::test]
async fn test_release_docs_gate_is_read_per_request() {
    let env = Arc::new(ToggleEnv::default());
    let server = server(config(RunMode::Release), env.clone());
    let router = server.router();

    let response = router
        .clone()
        .oneshot(request(Method::GET, "/swagger/doc.json"))
        .await
        .unwrap();
    let (status, body) = json_body(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "api docs are disabled");

    env.set("TEST_ENABLE_API_DOCS", "true");
    let response = router
        .clone()
        .oneshot(request(Method::GET, "/swagger/doc.json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    env.set("TEST_ENABLE_API_DOCS", "0");
    let response = router
        .clone()
        .oneshot(request(Method::GET, "/swagger/index.html"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    env.remove("TEST_ENABLE_API_DOCS");
}

#[tokio::test]
async fn test_static_files_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("app.css"), "body { margin: 0 }").unwrap();

    let mut config = config(RunMode::Debug);
    config.static_files.dir = dir.path().to_path_buf();
    let server = server(config, Arc::new(ToggleEnv::default()));

    let response = server
        .router()
        .oneshot(request(Method::GET, "/static/app.css"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        common::body_bytes(response).await,
        b"body { margin: 0 }".to_vec()
    );

    let response = server
        .router()
        .oneshot(request(Method::GET, "/static/missing.css"))
        .await
        .unwrap();
    let (status, body) = json_body(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], ROUTE_NOT_FOUND);
}

#[tokio::test]
async fn test_unconfigured_endpoint_answers_501() {
    let config = config(RunMode::Debug);
    let collaborators = Collaborators::from_config(&config);
    let server = HttpServer::new(config, collaborators, Vec::new()).unwrap();

    let response = server
        .router()
        .oneshot(request(Method::POST, "/v1/login"))
        .await
        .unwrap();
    let (status, body) = json_body(response).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["message"], "handler not configured");
}
