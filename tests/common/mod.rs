//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header::AUTHORIZATION, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use user_gateway::config::{AppConfig, RunMode};
use user_gateway::handlers::{handler_fn, BoxedHandler, Endpoint, HandlerSet};
use user_gateway::http::{HttpServer, Middleware, RequestIdExt};
use user_gateway::routing::Collaborators;
use user_gateway::security::{EnvLookup, JwtAuthenticator, Principal};

pub const TEST_SECRET: &str = "integration-test-secret";

/// Config for `mode` with a test secret and nothing bound to real ports.
pub fn config(mode: RunMode) -> AppConfig {
    let mut config = AppConfig::default();
    config.app.name = "users-test".into();
    config.app.mode = mode;
    config.auth.jwt_secret = TEST_SECRET.into();
    config.docs.release_gate_var = "TEST_ENABLE_API_DOCS".into();
    config.observability.metrics_enabled = false;
    config
}

/// Environment whose variables tests can flip between requests.
#[derive(Default)]
pub struct ToggleEnv {
    vars: RwLock<HashMap<String, String>>,
}

impl ToggleEnv {
    pub fn set(&self, name: &str, value: &str) {
        self.vars
            .write()
            .unwrap()
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove(&self, name: &str) {
        self.vars.write().unwrap().remove(name);
    }
}

impl EnvLookup for ToggleEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.read().unwrap().get(name).cloned()
    }
}

/// Handler echoing what it saw: endpoint, path, principal and request ID.
pub fn probe(endpoint: Endpoint) -> BoxedHandler {
    handler_fn(move |request: Request| async move {
        let user_id = request.extensions().get::<Principal>().map(|p| p.user_id);
        let request_id = request.request_id().map(|id| id.to_string());
        Json(json!({
            "endpoint": endpoint.name(),
            "path": request.uri().path(),
            "user_id": user_id,
            "request_id": request_id,
        }))
        .into_response()
    })
}

/// Probe handlers for every business endpoint.
pub fn probe_handlers() -> HandlerSet {
    [
        Endpoint::Register,
        Endpoint::Login,
        Endpoint::PhoneLogin,
        Endpoint::VerificationCode,
        Endpoint::GetUser,
        Endpoint::UpdateUser,
        Endpoint::Follow,
        Endpoint::FollowingList,
        Endpoint::FollowerList,
    ]
    .into_iter()
    .fold(HandlerSet::new(), |set, endpoint| set.with(endpoint, probe(endpoint)))
}

/// Server with probe handlers and a controllable environment.
pub fn server(config: AppConfig, env: Arc<ToggleEnv>) -> HttpServer {
    server_with(config, env, Vec::new())
}

pub fn server_with(
    config: AppConfig,
    env: Arc<ToggleEnv>,
    middleware: Vec<Arc<dyn Middleware>>,
) -> HttpServer {
    let collaborators = Collaborators::from_config(&config)
        .with_handlers(probe_handlers())
        .with_env(env);
    HttpServer::new(config, collaborators, middleware).unwrap()
}

pub fn token(user_id: u64) -> String {
    JwtAuthenticator::new(TEST_SECRET, 3600).issue(user_id).unwrap()
}

pub fn request(method: Method, path: &str) -> Request {
    Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

pub fn authorized(method: Method, path: &str, user_id: u64) -> Request {
    Request::builder()
        .method(method)
        .uri(path)
        .header(AUTHORIZATION, format!("Bearer {}", token(user_id)))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn json_body(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = body_bytes(response).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}
