//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every subscriber wakes → server stops accepting → drain → exit
//! ```
//!
//! # Design Decisions
//! - Startup is fail fast: config, validation and route assembly errors are
//!   fatal before the listener is bound
//! - Shutdown is broadcast so any number of tasks can observe it

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
