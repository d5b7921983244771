//! Per-target state and transition detection.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::RemediationConfig;
use crate::observability::metrics;
use crate::probe::ProbeOutcome;
use crate::remediation::RemediationDispatcher;
use crate::status::event::{Status, StatusEvent};
use crate::target::Target;

/// Mutable state of one target, owned by its scheduling loop.
#[derive(Debug, Clone, Default)]
pub struct TargetState {
    last_status: Status,
    last_transition_at: Option<DateTime<Utc>>,
    consecutive_down: u32,
    ticks: u64,
}

impl TargetState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_status(&self) -> Status {
        self.last_status
    }

    pub fn last_transition_at(&self) -> Option<DateTime<Utc>> {
        self.last_transition_at
    }

    /// Down ticks since the target last went down; 0 while up.
    pub fn consecutive_down(&self) -> u32 {
        self.consecutive_down
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

/// When a down target is handed to the remediation hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemediationPolicy {
    /// Fire again every N consecutive down ticks after the first trigger.
    pub retrigger_after: Option<u32>,
}

impl From<&RemediationConfig> for RemediationPolicy {
    fn from(config: &RemediationConfig) -> Self {
        Self {
            retrigger_after: config.retrigger_after,
        }
    }
}

impl RemediationPolicy {
    /// `consecutive_down` includes the current tick.
    fn should_fire(&self, previous: Status, consecutive_down: u32) -> bool {
        if previous != Status::Down {
            return true;
        }
        match self.retrigger_after {
            Some(n) if n > 0 => (consecutive_down - 1) % n == 0,
            _ => false,
        }
    }
}

/// Turns probe outcomes into status events.
///
/// Shared by all target loops; the per-target state is passed in by the
/// owning loop.
#[derive(Debug, Clone, Default)]
pub struct StatusTracker {
    policy: RemediationPolicy,
    remediation: Option<RemediationDispatcher>,
}

impl StatusTracker {
    pub fn new(policy: RemediationPolicy, remediation: Option<RemediationDispatcher>) -> Self {
        Self {
            policy,
            remediation,
        }
    }

    /// Fold `outcome` into `state` and describe the result.
    pub fn observe(
        &self,
        target: &Arc<Target>,
        state: &mut TargetState,
        outcome: &ProbeOutcome,
    ) -> StatusEvent {
        let status = if outcome.is_reachable() {
            Status::Up
        } else {
            Status::Down
        };
        let previous = state.last_status;
        let baseline = previous == Status::Unknown;
        let is_transition = !baseline && status != previous;

        state.last_status = status;
        state.ticks += 1;
        if is_transition {
            state.last_transition_at = Some(outcome.observed_at());
        }

        match status {
            Status::Down => {
                state.consecutive_down = state.consecutive_down.saturating_add(1);
                if self.policy.should_fire(previous, state.consecutive_down) {
                    if let Some(remediation) = &self.remediation {
                        remediation.dispatch(target);
                    }
                }
            }
            _ => state.consecutive_down = 0,
        }

        if is_transition {
            metrics::record_transition(&target.name, status.as_str());
            match status {
                Status::Down => tracing::warn!(
                    target_name = %target.name,
                    cause = ?outcome.cause(),
                    "Target went down"
                ),
                _ => tracing::info!(target_name = %target.name, "Target recovered"),
            }
        } else if baseline {
            tracing::info!(target_name = %target.name, %status, "Initial status");
        }
        metrics::record_probe(&target.name, outcome.cause(), outcome.latency());
        metrics::record_target_up(&target.name, status == Status::Up);

        StatusEvent {
            target: target.name.clone(),
            status,
            previous,
            is_transition,
            observed_at: outcome.observed_at(),
            latency: outcome.latency(),
            error: outcome.error().cloned(),
        }
    }
}
