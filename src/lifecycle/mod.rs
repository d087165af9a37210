//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init logging/metrics → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → End relay sessions → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Radio streams never end on their own, so shutdown ends them
//!   explicitly before axum waits for connections to drain

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
