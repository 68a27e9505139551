//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum::serve, graceful shutdown)
//!     → pipeline.rs (global middleware chain)
//!     → request.rs (request ID assigned and echoed)
//!     → [compiled route table: guard, then handler]
//!     → response.rs (JSON envelope, not-found sentinel)
//! ```

pub mod pipeline;
pub mod request;
pub mod response;
pub mod server;

pub use pipeline::{middleware_fn, Middleware, Pipeline, Stage, CORE_STAGES};
pub use request::{RequestId, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use response::{not_found, ApiResponse, ROUTE_NOT_FOUND};
pub use server::HttpServer;
