//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Start:
//!     Validate targets → spawn remediation worker → spawn one loop per target
//!
//! Stop (shutdown.rs):
//!     Trigger → loops finish their in-flight probe and exit
//!     → stragglers aborted after the shutdown timeout
//!     → remediation queue drained
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful stop (binary only)
//! ```
//!
//! # Design Decisions
//! - Construction errors are fatal and happen before any task starts
//! - Shutdown has a timeout: stuck tasks are aborted after the deadline

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
