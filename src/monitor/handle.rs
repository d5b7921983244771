//! Handle to a running monitor.

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::scheduler::{Scheduler, TargetTask};
use crate::status::StatusEvent;

/// Summary of a completed `stop`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Loops that exited on their own.
    pub stopped: usize,
    /// Loops aborted after the shutdown timeout.
    pub aborted: Vec<String>,
    /// False if pending remediation requests were abandoned.
    pub remediation_drained: bool,
}

/// Owns every running target loop.
///
/// Dropping the handle without calling `stop` aborts all loops immediately.
pub struct MonitorHandle {
    tasks: Vec<TargetTask>,
    scheduler: Option<Scheduler>,
    remediation_worker: Option<JoinHandle<()>>,
    events: broadcast::Sender<StatusEvent>,
    shutdown_timeout: Duration,
}

impl MonitorHandle {
    pub(crate) fn new(
        tasks: Vec<TargetTask>,
        scheduler: Scheduler,
        remediation_worker: Option<JoinHandle<()>>,
        events: broadcast::Sender<StatusEvent>,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            tasks,
            scheduler: Some(scheduler),
            remediation_worker,
            events,
            shutdown_timeout,
        }
    }

    /// Receive every status event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.events.subscribe()
    }

    /// Names of targets whose loops have not been cancelled.
    pub fn targets(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name()).collect()
    }

    /// Stop one target's loop without affecting the others.
    ///
    /// Returns false if no running target has that name.
    pub async fn cancel_target(&mut self, name: &str) -> bool {
        let Some(index) = self.tasks.iter().position(|t| t.name() == name) else {
            return false;
        };
        let task = self.tasks.remove(index);
        let graceful = task.stop(self.shutdown_timeout).await;
        tracing::info!(target_name = %name, graceful, "Target cancelled");
        true
    }

    /// Stop every loop and wait for them, up to the shutdown timeout.
    ///
    /// In-flight probes finish (they are bounded by the probe timeout) and
    /// publish their event before the loop exits. Once this returns no more
    /// events are emitted.
    pub async fn stop(mut self) -> ShutdownReport {
        let deadline = Instant::now() + self.shutdown_timeout;
        if let Some(scheduler) = &self.scheduler {
            scheduler.shutdown();
        }

        let mut report = ShutdownReport::default();
        for task in std::mem::take(&mut self.tasks) {
            let name = task.name().to_string();
            let remaining = deadline.saturating_duration_since(Instant::now());
            if task.join(remaining).await {
                report.stopped += 1;
            } else {
                report.aborted.push(name);
            }
        }

        // Dropping the scheduler drops the last dispatcher, letting the
        // remediation worker drain its queue and exit.
        self.scheduler.take();
        report.remediation_drained = match self.remediation_worker.take() {
            Some(mut worker) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                match tokio::time::timeout(remaining, &mut worker).await {
                    Ok(_) => true,
                    Err(_) => {
                        tracing::warn!("Remediation worker did not drain in time, aborting");
                        worker.abort();
                        false
                    }
                }
            }
            None => true,
        };

        tracing::info!(
            stopped = report.stopped,
            aborted = report.aborted.len(),
            remediation_drained = report.remediation_drained,
            "Monitor stopped"
        );
        report
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        if let Some(scheduler) = &self.scheduler {
            scheduler.shutdown();
        }
        for task in &self.tasks {
            task.abort();
        }
        if let Some(worker) = &self.remediation_worker {
            worker.abort();
        }
    }
}

impl std::fmt::Debug for MonitorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorHandle")
            .field("targets", &self.targets())
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish()
    }
}
