//! Per-request environment gate.
//!
//! In release mode the API docs stay registered but answer only while an
//! operator has opened the gate by setting an environment variable. The
//! variable is re-read on every request.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::http::response::error_response;

/// Message returned while the gate is closed.
pub const DOCS_DISABLED: &str = "api docs are disabled";

/// Source of environment values.
pub trait EnvLookup: Send + Sync + 'static {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// A gate keyed on one environment variable.
#[derive(Clone)]
pub struct EnvGate {
    var: String,
    env: Arc<dyn EnvLookup>,
}

impl EnvGate {
    pub fn new(var: impl Into<String>, env: Arc<dyn EnvLookup>) -> Self {
        Self {
            var: var.into(),
            env,
        }
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    /// Open when the variable holds `1`, `true`, `yes` or `on`.
    pub fn is_open(&self) -> bool {
        self.env
            .var(&self.var)
            .map(|value| is_truthy(&value))
            .unwrap_or(false)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Route guard for gated endpoints.
pub async fn require_open_gate(
    State(gate): State<EnvGate>,
    request: Request,
    next: Next,
) -> Response {
    if gate.is_open() {
        next.run(request).await
    } else {
        tracing::debug!(var = %gate.var(), path = %request.uri().path(), "Gate closed");
        error_response(StatusCode::NOT_FOUND, DOCS_DISABLED)
    }
}
