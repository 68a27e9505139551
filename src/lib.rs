//! HTTP entry point for the user service.
//!
//! Builds one axum router: a fixed global middleware chain, a not-found
//! sentinel, mode-dependent developer tooling (API docs, diagnostics), the
//! public auth routes and an authenticated `/v1/users` group.

// Core subsystems
pub mod config;
pub mod handlers;
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::Collaborators;
