//! Per-target polling scheduler.
//!
//! # Data Flow
//! ```text
//! Scheduler::spawn(target, prober)
//!     → one Tokio task per target (runner.rs)
//!     → loop: bounded probe → StatusTracker::observe → broadcast event → wait
//!     → exits on global shutdown or on the target's own cancel signal
//! ```
//!
//! # Design Decisions
//! - Fixed-delay by default: the full interval elapses after a check completes
//! - Fixed-rate is opt-in and skips ahead (never bursts) after a slow check
//! - Only the idle wait is cancellable; an in-flight probe always completes,
//!   and it is bounded by the probe timeout
//! - Probe failures and prober panics become down events; only cancellation
//!   ends a loop

mod runner;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::{ProbeSettings, ScheduleMode, SchedulerConfig};
use crate::lifecycle::Shutdown;
use crate::probe::Prober;
use crate::status::{StatusEvent, StatusTracker};
use crate::target::Target;

use runner::TargetLoop;

/// Timing knobs shared by every target loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub mode: ScheduleMode,
    /// Hard upper bound on a single probe, whatever the prober does.
    pub probe_timeout: Duration,
    /// Random delay in `[0, initial_jitter)` before the first probe.
    pub initial_jitter: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self::from_config(&SchedulerConfig::default(), &ProbeSettings::default())
    }
}

impl SchedulerSettings {
    pub fn from_config(scheduler: &SchedulerConfig, probes: &ProbeSettings) -> Self {
        Self {
            mode: scheduler.mode,
            probe_timeout: probes.timeout(),
            initial_jitter: Duration::from_millis(scheduler.initial_jitter_ms),
        }
    }
}

/// Spawns and stops target loops.
pub struct Scheduler {
    tracker: Arc<StatusTracker>,
    events: broadcast::Sender<StatusEvent>,
    settings: SchedulerSettings,
    shutdown: Shutdown,
}

impl Scheduler {
    pub fn new(
        tracker: StatusTracker,
        events: broadcast::Sender<StatusEvent>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            tracker: Arc::new(tracker),
            events,
            settings,
            shutdown: Shutdown::new(),
        }
    }

    /// Launch the polling loop for `target`.
    pub fn spawn(&self, target: Arc<Target>, prober: Arc<dyn Prober>) -> TargetTask {
        let cancel = Shutdown::new();
        let global_rx = self.shutdown.subscribe();
        let cancel_rx = cancel.subscribe();

        let runner = TargetLoop {
            target: target.clone(),
            prober,
            tracker: self.tracker.clone(),
            events: self.events.clone(),
            settings: self.settings,
        };

        tracing::debug!(
            target_name = %target.name,
            interval_ms = target.interval.as_millis() as u64,
            kind = %target.probe_kind,
            "Spawning target loop"
        );

        TargetTask {
            target,
            cancel,
            handle: tokio::spawn(runner.run(global_rx, cancel_rx)),
        }
    }

    /// Signal every loop spawned by this scheduler to stop.
    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }
}

/// A running target loop.
#[derive(Debug)]
pub struct TargetTask {
    target: Arc<Target>,
    cancel: Shutdown,
    handle: JoinHandle<()>,
}

impl TargetTask {
    pub fn name(&self) -> &str {
        &self.target.name
    }

    /// Ask this loop alone to stop after its current tick.
    pub fn cancel(&self) {
        self.cancel.trigger();
    }

    /// Cancel and wait up to `timeout`; abort if the loop has not exited.
    /// Returns false if the loop had to be aborted.
    pub async fn stop(self, timeout: Duration) -> bool {
        self.cancel();
        self.join(timeout).await
    }

    /// Wait up to `timeout` for the loop to exit, aborting it afterwards.
    pub(crate) async fn join(mut self, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, &mut self.handle).await {
            Ok(_) => true,
            Err(_) => {
                tracing::warn!(target_name = %self.target.name, "Target loop did not stop in time, aborting");
                self.handle.abort();
                let _ = self.handle.await;
                false
            }
        }
    }

    pub(crate) fn abort(&self) {
        self.handle.abort();
    }
}
