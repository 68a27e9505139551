//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Global chain (every request):
//!     → headers.rs (no-cache normalization)
//!     → cors.rs (CORS, OPTIONS short-circuit)
//!     → headers.rs (security response headers)
//!
//! Route guards (selected routes only):
//!     → auth.rs (principal required, `/v1/users` group)
//!     → env_gate.rs (release-mode docs gate)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a guard that cannot verify answers without calling the handler
//! - Guards never run for routes outside their group

pub mod auth;
pub mod cors;
pub mod env_gate;
pub mod headers;

pub use auth::{AuthError, Authenticator, JwtAuthenticator, Principal};
pub use env_gate::{EnvGate, EnvLookup, ProcessEnv};
