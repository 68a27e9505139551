//! Compile a [`RouteTable`] into an axum [`Router`].
//!
//! # Responsibilities
//! - One `MethodRouter` per pattern, one handler per (method, pattern)
//! - Attach each entry's guard as a route layer (after the global chain,
//!   before the handler, never on other routes)
//! - Install the not-found sentinel as router fallback, as method fallback
//!   of every pattern, and behind the static file server
//!
//! # Design Decisions
//! - Collaborators are passed in explicitly; nothing is read from globals
//! - The compiled router is immutable and cheap to clone

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::Request,
    handler::HandlerWithoutStateExt,
    middleware::from_fn_with_state,
    routing::{on, MethodFilter, MethodRouter},
    Router,
};
use tower_http::services::ServeDir;

use crate::config::AppConfig;
use crate::handlers::{
    diagnostics::diagnostics_handler,
    docs::{docs_handler, ApiDocument},
    not_configured, BoxedHandler, Endpoint, HandlerSet,
};
use crate::http::response::not_found;
use crate::routing::table::{Guard, RouteEntry, RouteError, RouteTable, Target};
use crate::security::{
    auth::require_principal,
    env_gate::require_open_gate,
    Authenticator, EnvGate, EnvLookup, JwtAuthenticator, ProcessEnv,
};

/// External collaborators the compiled routes call into.
#[derive(Clone)]
pub struct Collaborators {
    pub handlers: HandlerSet,
    pub authenticator: Arc<dyn Authenticator>,
    pub env: Arc<dyn EnvLookup>,
    pub static_dir: PathBuf,
}

impl Collaborators {
    /// Defaults: JWT verification with the configured secret, the process
    /// environment, the configured static directory and no business handlers.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            handlers: HandlerSet::new(),
            authenticator: Arc::new(JwtAuthenticator::new(
                &config.auth.jwt_secret,
                config.auth.token_ttl_secs,
            )),
            env: Arc::new(ProcessEnv),
            static_dir: config.static_files.dir.clone(),
        }
    }

    pub fn with_handlers(mut self, handlers: HandlerSet) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    pub fn with_env(mut self, env: Arc<dyn EnvLookup>) -> Self {
        self.env = env;
        self
    }
}

/// Build the axum router serving `table`.
pub fn compile(
    table: &RouteTable,
    config: &AppConfig,
    collaborators: &Collaborators,
) -> Result<Router, RouteError> {
    let defaults = Defaults::new(table, config);
    let mut router = Router::new();

    for path in table.paths() {
        let mut methods: MethodRouter = MethodRouter::new();
        let mut static_mount = false;

        for (_, position) in &path.methods {
            let entry = table.entry(*position);
            match entry.target {
                Target::StaticFiles => static_mount = true,
                Target::Handler(endpoint) => {
                    let handler = collaborators
                        .handlers
                        .get(endpoint)
                        .unwrap_or_else(|| defaults.handler(endpoint));
                    methods = methods.merge(method_route(entry, handler, collaborators)?);
                }
            }
        }

        // `RouteTable::build` rejects handlers sharing a static mount's pattern.
        if static_mount {
            let prefix = path.pattern.trim_end_matches("/{*path}");
            let files = ServeDir::new(&collaborators.static_dir)
                .call_fallback_on_method_not_allowed(true)
                .fallback(not_found.into_service());
            router = router.nest_service(prefix, files);
        } else {
            router = router.route(&path.pattern, methods.fallback(not_found));
        }
    }

    Ok(router.fallback(not_found))
}

fn method_route(
    entry: &RouteEntry,
    handler: BoxedHandler,
    collaborators: &Collaborators,
) -> Result<MethodRouter, RouteError> {
    let filter = MethodFilter::try_from(entry.method.clone())
        .map_err(|_| RouteError::UnsupportedMethod {
            method: entry.method.clone(),
        })?;
    let route = on(filter, move |request: Request| handler(request));

    Ok(match &entry.guard {
        Guard::Open => route,
        Guard::Principal => route.route_layer(from_fn_with_state(
            collaborators.authenticator.clone(),
            require_principal,
        )),
        Guard::EnvGate { var } => route.route_layer(from_fn_with_state(
            EnvGate::new(var.clone(), collaborators.env.clone()),
            require_open_gate,
        )),
    })
}

/// Built-in handlers for endpoints the caller left unset.
struct Defaults {
    docs: BoxedHandler,
    diagnostics: BoxedHandler,
}

impl Defaults {
    fn new(table: &RouteTable, config: &AppConfig) -> Self {
        let document = ApiDocument::new(config.app.name.clone(), config.app.mode, table.describe());
        Self {
            docs: docs_handler(document),
            diagnostics: diagnostics_handler(config.app.name.clone(), config.app.mode),
        }
    }

    fn handler(&self, endpoint: Endpoint) -> BoxedHandler {
        match endpoint {
            Endpoint::ApiDocs => self.docs.clone(),
            Endpoint::Profiling => self.diagnostics.clone(),
            other => not_configured(other),
        }
    }
}
