//! Monitored target descriptors.
//!
//! A `Target` is built once before the monitor starts and is shared read-only
//! (behind an `Arc`) between its scheduling loop, its prober and the
//! remediation hook.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Strategy used to probe a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    /// Open a TCP connection to `host:port` and close it immediately.
    RawConnect,
    /// Issue a GET and classify the response status.
    Http,
    /// A prober registered under this name.
    Custom(String),
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeKind::RawConnect => write!(f, "raw_connect"),
            ProbeKind::Http => write!(f, "http"),
            ProbeKind::Custom(name) => write!(f, "custom:{}", name),
        }
    }
}

/// What an external collaborator needs to remediate a failing target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Remediation {
    /// Local image identifier used to deploy a replacement.
    pub image: String,

    /// Optional free-form command for the remediation collaborator.
    #[serde(default)]
    pub command: Option<String>,
}

impl Remediation {
    pub fn image(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            command: None,
        }
    }
}

/// A single monitored endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Unique, non-empty name.
    pub name: String,
    /// `host:port` for raw-connect, a URL for http, free-form for custom.
    pub address: String,
    pub probe_kind: ProbeKind,
    /// Delay between checks. Must be non-zero.
    pub interval: Duration,
    pub remediation: Option<Remediation>,
}

impl Target {
    /// Create a target without a remediation descriptor.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        probe_kind: ProbeKind,
        interval: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            probe_kind,
            interval,
            remediation: None,
        }
    }

    /// Attach a remediation descriptor.
    pub fn with_remediation(mut self, remediation: Remediation) -> Self {
        self.remediation = Some(remediation);
        self
    }
}
