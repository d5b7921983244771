//! Probe subsystem.
//!
//! # Data Flow
//! ```text
//! Scheduler tick
//!     → registry.rs (ProbeKind → Arc<dyn Prober>)
//!     → tcp.rs / http.rs / command.rs / custom prober
//!     → ProbeOutcome { reachable, observed_at, latency, error }
//! ```
//!
//! # Design Decisions
//! - Probers never return errors; failures fold into a down outcome
//! - Every failure carries a classified cause (timeout, refused, protocol, other)
//! - Every built-in prober has an explicit timeout; the scheduler adds a
//!   second guard around any prober, custom ones included

pub mod command;
pub mod custom;
pub mod http;
pub mod registry;
pub mod tcp;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::io;
use std::time::Duration;

use crate::target::Target;

pub use command::CommandProber;
pub use custom::FnProber;
pub use http::HttpProber;
pub use registry::ProberRegistry;
pub use tcp::TcpProber;

/// Why a probe failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// No answer within the probe timeout.
    Timeout,
    /// The peer actively refused the connection.
    Refused,
    /// Connected, but the exchange failed (TLS, HTTP, bad status).
    ProtocolError,
    /// Anything else (DNS, unreachable network, spawn failures).
    Other,
}

impl FailureCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCause::Timeout => "timeout",
            FailureCause::Refused => "refused",
            FailureCause::ProtocolError => "protocol_error",
            FailureCause::Other => "other",
        }
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified probe failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeError {
    pub cause: FailureCause,
    pub message: String,
}

impl ProbeError {
    pub fn new(cause: FailureCause, message: impl Into<String>) -> Self {
        Self {
            cause,
            message: message.into(),
        }
    }

    /// Classify an IO error from a connect or read.
    pub fn from_io(err: &io::Error) -> Self {
        Self::new(classify_io(err), err.to_string())
    }

    /// A probe that exceeded `timeout`.
    pub fn timed_out(timeout: Duration) -> Self {
        Self::new(
            FailureCause::Timeout,
            format!("no response within {}ms", timeout.as_millis()),
        )
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.cause, self.message)
    }
}

pub(crate) fn classify_io(err: &io::Error) -> FailureCause {
    match err.kind() {
        io::ErrorKind::ConnectionRefused => FailureCause::Refused,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => FailureCause::Timeout,
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::UnexpectedEof
        | io::ErrorKind::InvalidData => FailureCause::ProtocolError,
        _ => FailureCause::Other,
    }
}

/// Result of a single check. `error` is present iff the target is unreachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    reachable: bool,
    observed_at: DateTime<Utc>,
    latency: Duration,
    error: Option<ProbeError>,
}

impl ProbeOutcome {
    /// A reachable outcome observed now.
    pub fn up(latency: Duration) -> Self {
        Self {
            reachable: true,
            observed_at: Utc::now(),
            latency,
            error: None,
        }
    }

    /// An unreachable outcome observed now.
    pub fn down(error: ProbeError, latency: Duration) -> Self {
        Self {
            reachable: false,
            observed_at: Utc::now(),
            latency,
            error: Some(error),
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn error(&self) -> Option<&ProbeError> {
        self.error.as_ref()
    }

    pub fn cause(&self) -> Option<FailureCause> {
        self.error.as_ref().map(|e| e.cause)
    }
}

/// A reachability check strategy.
///
/// Implementations must be safe to call concurrently from many target loops
/// and must return within a bounded time.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Perform one check against `target`.
    async fn check(&self, target: &Target) -> ProbeOutcome;
}
