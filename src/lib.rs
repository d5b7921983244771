//! Concurrent health-monitoring core.
//!
//! Probes a fixed set of targets on independent schedules, classifies each
//! as up or down, publishes a `StatusEvent` per tick and hands targets that
//! go down to a remediation hook.

pub mod config;
pub mod lifecycle;
pub mod monitor;
pub mod observability;
pub mod probe;
pub mod remediation;
pub mod scheduler;
pub mod status;
pub mod target;

pub use config::MonitorConfig;
pub use monitor::{Monitor, MonitorError, MonitorHandle, MonitorSettings, ShutdownReport};
pub use probe::{FailureCause, ProbeError, ProbeOutcome, Prober, ProberRegistry};
pub use remediation::{RemediationError, RemediationHook};
pub use status::{Status, StatusEvent};
pub use target::{ProbeKind, Remediation, Target};
