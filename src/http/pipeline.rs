//! The global middleware chain.
//!
//! Every request passes through the same stages, outermost first:
//!
//! ```text
//! no-cache → cors/options → security headers → logging → request id
//!     → metrics → tracing → caller-supplied units → [routing] → handler
//! ```
//!
//! Later stages rely on earlier ones: logging reads the request ID echoed on
//! the response, tracing records it on the span, and the header stages wrap
//! everything below so error and not-found responses carry the headers too.
//!
//! A [`Pipeline`] is applied once per router. Applying a second pipeline to
//! the same router stacks a second copy of the chain.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::{from_fn, from_fn_with_state, Next},
    response::Response,
    Router,
};
use futures_util::future::BoxFuture;
use tower::ServiceBuilder;

use crate::config::AppConfig;
use crate::http::request::RequestIdLayer;
use crate::observability::{logging, metrics, tracing::trace_layer};
use crate::security::{
    cors::{answer_options, cors_layer},
    headers::{no_cache_layer, secure_headers, SecureHeaders},
};

/// A caller-supplied middleware unit, run after the core chain.
pub trait Middleware: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Inspect or rewrite the request, then either call `next` or answer.
    fn handle(&self, request: Request, next: Next) -> BoxFuture<'static, Response>;
}

struct FnMiddleware<F> {
    name: String,
    f: F,
}

impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, request: Request, next: Next) -> BoxFuture<'static, Response> {
        Box::pin((self.f)(request, next))
    }
}

/// Wrap an async function as a named [`Middleware`].
pub fn middleware_fn<F, Fut>(name: impl Into<String>, f: F) -> Arc<dyn Middleware>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(FnMiddleware {
        name: name.into(),
        f,
    })
}

/// One position in the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    NoCache,
    Cors,
    SecureHeaders,
    Logging,
    RequestId,
    Metrics,
    Trace,
    Custom(String),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::NoCache => f.write_str("no-cache"),
            Stage::Cors => f.write_str("cors"),
            Stage::SecureHeaders => f.write_str("secure-headers"),
            Stage::Logging => f.write_str("logging"),
            Stage::RequestId => f.write_str("request-id"),
            Stage::Metrics => f.write_str("metrics"),
            Stage::Trace => f.write_str("trace"),
            Stage::Custom(name) => write!(f, "custom:{name}"),
        }
    }
}

/// The core chain, outermost first. Not configurable.
pub const CORE_STAGES: [Stage; 7] = [
    Stage::NoCache,
    Stage::Cors,
    Stage::SecureHeaders,
    Stage::Logging,
    Stage::RequestId,
    Stage::Metrics,
    Stage::Trace,
];

/// The global middleware chain for one router.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<AppConfig>,
    units: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            units: Vec::new(),
        }
    }

    /// Append a caller-supplied unit. Units run in the order added, after
    /// the core chain.
    pub fn with(mut self, unit: Arc<dyn Middleware>) -> Self {
        self.units.push(unit);
        self
    }

    /// Stages in execution order.
    pub fn stages(&self) -> Vec<Stage> {
        CORE_STAGES
            .iter()
            .cloned()
            .chain(self.units.iter().map(|u| Stage::Custom(u.name().to_string())))
            .collect()
    }

    /// Wrap `router` in the chain.
    ///
    /// The router must already carry its routes and fallback: axum only
    /// layers what is registered at the time of the call.
    pub fn apply(self, router: Router) -> Router {
        // `Router::layer` makes the newest layer the outermost, so install
        // innermost first.
        let mut router = router;
        for unit in self.units.iter().rev() {
            router = router.layer(from_fn_with_state(unit.clone(), run_unit));
        }
        for stage in CORE_STAGES.iter().rev() {
            router = self.install(router, stage);
        }

        tracing::debug!(
            stages = %self.stages().iter().map(ToString::to_string).collect::<Vec<_>>().join(" → "),
            "Middleware chain installed"
        );
        router
    }

    fn install(&self, router: Router, stage: &Stage) -> Router {
        let security = &self.config.security;
        match stage {
            Stage::NoCache => router.layer(no_cache_layer()),
            Stage::Cors => router.layer(
                ServiceBuilder::new()
                    .layer(from_fn(answer_options))
                    .layer(cors_layer(security)),
            ),
            Stage::SecureHeaders => router.layer(from_fn_with_state(
                SecureHeaders::from(security),
                secure_headers,
            )),
            Stage::Logging => router.layer(from_fn(logging::log_request)),
            Stage::RequestId => router.layer(RequestIdLayer),
            Stage::Metrics => router.layer(from_fn(metrics::track_request)),
            Stage::Trace => router.layer(trace_layer()),
            Stage::Custom(_) => router,
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages())
            .finish()
    }
}

async fn run_unit(
    State(unit): State<Arc<dyn Middleware>>,
    request: Request,
    next: Next,
) -> Response {
    unit.handle(request, next).await
}
