//! Terminal handlers.
//!
//! Business handlers (registration, login, follow, ...) live outside this
//! crate. They are plugged in as [`BoxedHandler`]s keyed by [`Endpoint`];
//! anything left unset answers `501` with the shared envelope. The docs and
//! diagnostics endpoints have built-in defaults.

pub mod diagnostics;
pub mod docs;

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::{extract::Request, http::StatusCode, response::Response};
use futures_util::future::BoxFuture;
use serde::Serialize;

use crate::http::response::error_response;

/// Message returned by endpoints with no handler installed.
pub const HANDLER_NOT_CONFIGURED: &str = "handler not configured";

/// Every terminal handler the route table can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Register,
    Login,
    PhoneLogin,
    VerificationCode,
    GetUser,
    UpdateUser,
    Follow,
    FollowingList,
    FollowerList,
    ApiDocs,
    Profiling,
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Register => "register",
            Endpoint::Login => "login",
            Endpoint::PhoneLogin => "phone_login",
            Endpoint::VerificationCode => "verification_code",
            Endpoint::GetUser => "get_user",
            Endpoint::UpdateUser => "update_user",
            Endpoint::Follow => "follow",
            Endpoint::FollowingList => "following_list",
            Endpoint::FollowerList => "follower_list",
            Endpoint::ApiDocs => "api_docs",
            Endpoint::Profiling => "profiling",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type-erased terminal handler.
pub type BoxedHandler = Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// Box an async function as a handler.
pub fn handler_fn<F, Fut>(f: F) -> BoxedHandler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |request| Box::pin(f(request)))
}

/// Handlers installed for each endpoint.
#[derive(Clone, Default)]
pub struct HandlerSet {
    handlers: HashMap<Endpoint, BoxedHandler>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler` for `endpoint`, replacing any previous one.
    pub fn with(mut self, endpoint: Endpoint, handler: BoxedHandler) -> Self {
        self.handlers.insert(endpoint, handler);
        self
    }

    pub fn get(&self, endpoint: Endpoint) -> Option<BoxedHandler> {
        self.handlers.get(&endpoint).cloned()
    }

    pub fn contains(&self, endpoint: Endpoint) -> bool {
        self.handlers.contains_key(&endpoint)
    }
}

impl fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

/// Fallback for endpoints without an installed handler.
pub fn not_configured(endpoint: Endpoint) -> BoxedHandler {
    handler_fn(move |_request| async move {
        tracing::warn!(endpoint = %endpoint, "No handler installed");
        error_response(StatusCode::NOT_IMPLEMENTED, HANDLER_NOT_CONFIGURED)
    })
}
