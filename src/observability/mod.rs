//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Probe, tracker, scheduler and remediation produce:
//!     → tracing events (structured, never formatted by the core)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → logging.rs subscriber installed by the binary
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Status events are the primary output; logs and metrics are secondary
//! - Metrics are cheap no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
