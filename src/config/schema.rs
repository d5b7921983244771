//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::target::{ProbeKind, Remediation, Target};

/// Root configuration for the monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Targets to monitor, in configuration order.
    pub targets: Vec<TargetConfig>,

    /// Probe timeouts and HTTP client settings.
    pub probes: ProbeSettings,

    /// Scheduling and shutdown behavior.
    pub scheduler: SchedulerConfig,

    /// Remediation dispatch settings.
    pub remediation: RemediationConfig,

    /// Command-based custom probes, referenced as `probe = { custom = "<name>" }`.
    pub custom_probes: Vec<CommandProbeConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// A monitored target as it appears in the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetConfig {
    /// Unique target identifier for events, logs and metrics.
    pub name: String,

    /// `host:port` or URL depending on the probe kind.
    pub address: String,

    /// Probe strategy.
    pub probe: ProbeKind,

    /// Check interval in seconds.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Optional remediation descriptor.
    #[serde(default)]
    pub remediation: Option<Remediation>,
}

fn default_interval_secs() -> u64 {
    30
}

impl TargetConfig {
    /// Convert into the descriptor consumed by the monitor.
    pub fn to_target(&self) -> Target {
        Target {
            name: self.name.clone(),
            address: self.address.clone(),
            probe_kind: self.probe.clone(),
            interval: Duration::from_secs(self.interval_secs),
            remediation: self.remediation.clone(),
        }
    }
}

/// Probe settings shared by every target.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Upper bound for a single probe in milliseconds.
    pub timeout_ms: u64,

    /// HTTP probe settings.
    pub http: HttpProbeConfig,
}

impl ProbeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            http: HttpProbeConfig::default(),
        }
    }
}

/// Which HTTP statuses count as healthy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusPolicy {
    /// Any 2xx.
    #[default]
    Success,
    /// Any 2xx or 3xx.
    SuccessOrRedirect,
    /// Only the listed codes.
    Codes(Vec<u16>),
}

impl StatusPolicy {
    /// Return true if `status` is accepted as healthy.
    pub fn accepts(&self, status: u16) -> bool {
        match self {
            StatusPolicy::Success => (200..300).contains(&status),
            StatusPolicy::SuccessOrRedirect => (200..400).contains(&status),
            StatusPolicy::Codes(codes) => codes.contains(&status),
        }
    }
}

/// HTTP probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpProbeConfig {
    /// Status classification policy.
    pub accept: StatusPolicy,

    /// Maximum idle pooled connections kept per host.
    pub pool_max_idle_per_host: usize,

    /// Idle pooled connections are closed after this many seconds.
    pub pool_idle_timeout_secs: u64,

    /// User agent sent with every probe.
    pub user_agent: String,

    /// Ignore proxy environment variables.
    pub no_proxy: bool,
}

impl Default for HttpProbeConfig {
    fn default() -> Self {
        Self {
            accept: StatusPolicy::Success,
            pool_max_idle_per_host: 2,
            pool_idle_timeout_secs: 30,
            user_agent: concat!("uptime-monitor/", env!("CARGO_PKG_VERSION")).to_string(),
            no_proxy: false,
        }
    }
}

/// How the next tick is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleMode {
    /// Sleep the full interval after each check completes.
    #[default]
    FixedDelay,
    /// Tick every interval measured from the previous check's start.
    FixedRate,
}

/// Scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Tick scheduling mode.
    pub mode: ScheduleMode,

    /// How long `stop` waits for loops before aborting them, in milliseconds.
    pub shutdown_timeout_ms: u64,

    /// Random delay in `[0, initial_jitter_ms)` before a target's first probe.
    pub initial_jitter_ms: u64,

    /// Capacity of the status event broadcast channel.
    pub event_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            mode: ScheduleMode::FixedDelay,
            shutdown_timeout_ms: 10_000,
            initial_jitter_ms: 0,
            event_capacity: 1024,
        }
    }
}

/// Remediation dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RemediationConfig {
    /// Pending remediation requests; extra requests are dropped.
    pub queue_capacity: usize,

    /// Re-trigger remediation every N consecutive down ticks while a target
    /// stays down. Unset means only the down transition triggers it.
    pub retrigger_after: Option<u32>,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            retrigger_after: None,
        }
    }
}

/// A custom probe that runs an external program.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommandProbeConfig {
    /// Name referenced by `probe = { custom = "<name>" }`.
    pub name: String,

    /// Program to execute. Exit status 0 means up.
    pub program: String,

    /// Arguments. `{address}` is replaced with the target address.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
