//! Status values and events.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

use crate::probe::ProbeError;

/// Classified status of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Not yet observed.
    #[default]
    Unknown,
    Up,
    Down,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Unknown => "unknown",
            Status::Up => "up",
            Status::Down => "down",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emitted once per tick per target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEvent {
    /// Target name.
    pub target: String,
    /// `Up` or `Down`; never `Unknown`.
    pub status: Status,
    /// Status before this observation; `Unknown` for the baseline.
    pub previous: Status,
    pub is_transition: bool,
    pub observed_at: DateTime<Utc>,
    #[serde(rename = "latency_ms", serialize_with = "serialize_millis")]
    pub latency: Duration,
    /// Classified failure when `status` is `Down`.
    pub error: Option<ProbeError>,
}

fn serialize_millis<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}

impl StatusEvent {
    /// True for the first event of a target.
    pub fn is_baseline(&self) -> bool {
        self.previous == Status::Unknown
    }
}
