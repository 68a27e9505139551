//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Assembly (at startup):
//!     AppConfig (mode, docs gate)
//!     → assembly.rs (ConditionalRoutes + fixed route set)
//!     → table.rs (validate: patterns, conflicts, duplicates)
//!     → Freeze as immutable RouteTable
//!     → router.rs (compile into axum Router with guards and sentinel)
//!
//! Per request (axum):
//!     (method, path) → matched entry → guard (if any) → handler
//!     no match / wrong method → not-found sentinel
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Any routing error aborts startup
//! - Deterministic: same input always matches same route

pub mod assembly;
pub mod router;
pub mod table;

pub use assembly::{assemble, ConditionalRoutes};
pub use router::{compile, Collaborators};
pub use table::{
    Guard, Resolution, RouteDescription, RouteEntry, RouteError, RouteTable, RouteTableBuilder,
    Target,
};
