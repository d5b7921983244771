//! The per-target polling loop.

use futures_util::FutureExt;
use rand::Rng;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::ScheduleMode;
use crate::probe::{FailureCause, ProbeError, ProbeOutcome, Prober};
use crate::scheduler::SchedulerSettings;
use crate::status::{StatusEvent, StatusTracker, TargetState};
use crate::target::Target;

pub(crate) struct TargetLoop {
    pub(crate) target: Arc<Target>,
    pub(crate) prober: Arc<dyn Prober>,
    pub(crate) tracker: Arc<StatusTracker>,
    pub(crate) events: broadcast::Sender<StatusEvent>,
    pub(crate) settings: SchedulerSettings,
}

impl TargetLoop {
    pub(crate) async fn run(
        self,
        mut shutdown: broadcast::Receiver<()>,
        mut cancel: broadcast::Receiver<()>,
    ) {
        let jitter = self.initial_delay();
        if !jitter.is_zero() {
            tokio::select! {
                _ = time::sleep(jitter) => {}
                _ = shutdown.recv() => return,
                _ = cancel.recv() => return,
            }
        }

        let period = self.target.interval;
        let mut ticker = match self.settings.mode {
            ScheduleMode::FixedRate => {
                let mut ticker = time::interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                Some(ticker)
            }
            ScheduleMode::FixedDelay => None,
        };

        // TargetState lives and dies with this loop.
        let mut state = TargetState::new();

        loop {
            let outcome = self.probe().await;
            let event = self.tracker.observe(&self.target, &mut state, &outcome);
            // No subscribers is not an error.
            let _ = self.events.send(event);

            let idle = async {
                match ticker.as_mut() {
                    Some(ticker) => {
                        ticker.tick().await;
                    }
                    None => time::sleep(period).await,
                }
            };

            tokio::select! {
                _ = idle => {}
                _ = shutdown.recv() => break,
                _ = cancel.recv() => break,
            }
        }

        tracing::debug!(
            target_name = %self.target.name,
            ticks = state.ticks(),
            last_status = %state.last_status(),
            "Target loop stopped"
        );
    }

    /// One bounded probe. Never fails: timeouts and panics become down outcomes.
    async fn probe(&self) -> ProbeOutcome {
        let timeout = self.settings.probe_timeout;
        let start = Instant::now();
        let check = AssertUnwindSafe(self.prober.check(&self.target)).catch_unwind();

        match time::timeout(timeout, check).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => {
                tracing::error!(target_name = %self.target.name, "Prober panicked");
                ProbeOutcome::down(
                    ProbeError::new(FailureCause::Other, "prober panicked"),
                    start.elapsed(),
                )
            }
            Err(_) => {
                tracing::debug!(target_name = %self.target.name, "Probe exceeded scheduler timeout");
                ProbeOutcome::down(ProbeError::timed_out(timeout), start.elapsed())
            }
        }
    }

    fn initial_delay(&self) -> Duration {
        let max_ms = self.settings.initial_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
    }
}
