//! Monitor construction and lifecycle.
//!
//! # Data Flow
//! ```text
//! Vec<Target> + ProberRegistry + Option<RemediationHook>
//!     → Monitor::new (validate, resolve probers)
//!     → Monitor::start → MonitorHandle (one loop per target)
//!     → subscribers receive StatusEvents via broadcast
//!     → MonitorHandle::stop → ShutdownReport
//! ```
//!
//! # Design Decisions
//! - Every configuration error is found in `new`, before any task starts
//! - No globals: targets, probers, hook and settings are all passed in
//! - A slow subscriber lags on its own receiver and never blocks a loop

mod handle;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::validation::validate_targets;
use crate::config::{MonitorConfig, ValidationError};
use crate::probe::{ProberRegistry, Prober};
use crate::remediation::{RemediationDispatcher, RemediationHook};
use crate::scheduler::{Scheduler, SchedulerSettings};
use crate::status::{RemediationPolicy, StatusEvent, StatusTracker};
use crate::target::Target;

pub use handle::{MonitorHandle, ShutdownReport};

/// Errors raised while building a monitor.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("invalid monitor configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ValidationError>),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Tunables that are not part of any single target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub scheduler: SchedulerSettings,
    /// How long `stop` waits before aborting loops and the remediation worker.
    pub shutdown_timeout: Duration,
    /// Capacity of the shared event ring buffer; a subscriber that falls
    /// further behind than this sees `Lagged`.
    pub event_capacity: usize,
    /// Pending remediation requests before new ones are dropped.
    pub remediation_queue: usize,
    pub remediation_policy: RemediationPolicy,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}

impl MonitorSettings {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            scheduler: SchedulerSettings::from_config(&config.scheduler, &config.probes),
            shutdown_timeout: Duration::from_millis(config.scheduler.shutdown_timeout_ms),
            event_capacity: config.scheduler.event_capacity,
            remediation_queue: config.remediation.queue_capacity,
            remediation_policy: RemediationPolicy::from(&config.remediation),
        }
    }

    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.scheduler.probe_timeout.is_zero() {
            errors.push(ValidationError::ZeroValue("probe timeout"));
        }
        if self.shutdown_timeout.is_zero() {
            errors.push(ValidationError::ZeroValue("shutdown timeout"));
        }
        if self.event_capacity == 0 {
            errors.push(ValidationError::ZeroValue("event capacity"));
        }
        if self.remediation_queue == 0 {
            errors.push(ValidationError::ZeroValue("remediation queue"));
        }
        if self.remediation_policy.retrigger_after == Some(0) {
            errors.push(ValidationError::ZeroValue("remediation retrigger interval"));
        }
        errors
    }
}

/// A validated, not yet running monitor.
pub struct Monitor {
    targets: Vec<(Arc<Target>, Arc<dyn Prober>)>,
    hook: Option<Arc<dyn RemediationHook>>,
    settings: MonitorSettings,
    events: broadcast::Sender<StatusEvent>,
}

impl Monitor {
    /// Validate `targets` and resolve a prober for each.
    pub fn new(
        targets: Vec<Target>,
        registry: &ProberRegistry,
        hook: Option<Arc<dyn RemediationHook>>,
        settings: MonitorSettings,
    ) -> Result<Self, MonitorError> {
        let mut errors = validate_targets(&targets);
        errors.extend(settings.validate());

        let mut resolved = Vec::with_capacity(targets.len());
        for target in targets {
            match registry.get(&target.probe_kind) {
                Some(prober) => resolved.push((Arc::new(target), prober)),
                None => errors.push(ValidationError::UnknownProbeKind {
                    name: target.name.clone(),
                    kind: target.probe_kind.clone(),
                }),
            }
        }

        if !errors.is_empty() {
            return Err(MonitorError::InvalidConfig(errors));
        }

        let (events, _) = broadcast::channel(settings.event_capacity);
        Ok(Self {
            targets: resolved,
            hook,
            settings,
            events,
        })
    }

    /// Build a monitor from a loaded config: default probers plus the
    /// configured command probes.
    pub fn from_config(
        config: &MonitorConfig,
        hook: Option<Arc<dyn RemediationHook>>,
    ) -> Result<Self, MonitorError> {
        let mut registry = ProberRegistry::with_defaults(&config.probes)?;
        registry.register_commands(&config.custom_probes, &config.probes);

        let targets = config.targets.iter().map(|t| t.to_target()).collect();
        Self::new(targets, &registry, hook, MonitorSettings::from_config(config))
    }

    /// Receive every status event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.events.subscribe()
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter().map(|(t, _)| t.as_ref())
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Launch one loop per target. Must be called inside a Tokio runtime.
    pub fn start(self) -> MonitorHandle {
        let (dispatcher, worker) = match self.hook {
            Some(hook) => {
                let (dispatcher, worker) =
                    RemediationDispatcher::spawn(hook, self.settings.remediation_queue);
                (Some(dispatcher), Some(worker))
            }
            None => (None, None),
        };

        let tracker = StatusTracker::new(self.settings.remediation_policy, dispatcher);
        let scheduler = Scheduler::new(tracker, self.events.clone(), self.settings.scheduler);

        let tasks = self
            .targets
            .into_iter()
            .map(|(target, prober)| scheduler.spawn(target, prober))
            .collect::<Vec<_>>();

        tracing::info!(
            targets = tasks.len(),
            mode = ?self.settings.scheduler.mode,
            "Monitor started"
        );

        MonitorHandle::new(
            tasks,
            scheduler,
            worker,
            self.events,
            self.settings.shutdown_timeout,
        )
    }

    /// Run until `signal` resolves, then stop.
    pub async fn run_until<F>(self, signal: F) -> ShutdownReport
    where
        F: Future<Output = ()>,
    {
        let handle = self.start();
        signal.await;
        handle.stop().await
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("targets", &self.targets().map(|t| &t.name).collect::<Vec<_>>())
            .field("has_hook", &self.hook.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{FnProber, ProbeOutcome};
    use crate::target::ProbeKind;

    fn registry() -> ProberRegistry {
        let mut registry = ProberRegistry::new();
        registry.register(
            ProbeKind::RawConnect,
            FnProber::new(|_: Target| async { ProbeOutcome::up(Duration::ZERO) }),
        );
        registry
    }

    fn tcp(name: &str, secs: u64) -> Target {
        Target::new(name, "127.0.0.1:9", ProbeKind::RawConnect, Duration::from_secs(secs))
    }

    #[test]
    fn test_new_rejects_empty_target_set() {
        let err = Monitor::new(vec![], &registry(), None, MonitorSettings::default()).unwrap_err();
        match err {
            MonitorError::InvalidConfig(errors) => {
                assert_eq!(errors, vec![ValidationError::NoTargets])
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_new_rejects_unknown_kind_and_zero_interval() {
        let targets = vec![
            tcp("zero", 0),
            Target::new("web", "http://127.0.0.1/", ProbeKind::Http, Duration::from_secs(1)),
        ];
        let err = Monitor::new(targets, &registry(), None, MonitorSettings::default()).unwrap_err();
        let MonitorError::InvalidConfig(errors) = err else {
            panic!("expected InvalidConfig");
        };
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&ValidationError::ZeroInterval("zero".into())));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::UnknownProbeKind { name, .. } if name == "web")));
    }

    #[test]
    fn test_new_rejects_zero_settings() {
        let settings = MonitorSettings {
            event_capacity: 0,
            ..MonitorSettings::default()
        };
        let err = Monitor::new(vec![tcp("a", 1)], &registry(), None, settings).unwrap_err();
        assert!(err.to_string().contains("event capacity"));
    }

    #[test]
    fn test_new_keeps_target_order() {
        let monitor = Monitor::new(
            vec![tcp("b", 1), tcp("a", 2)],
            &registry(),
            None,
            MonitorSettings::default(),
        )
        .unwrap();
        let names: Vec<_> = monitor.targets().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_from_config() {
        let config = crate::config::parse_config(
            r#"
            [[custom_probes]]
            name = "true"
            program = "true"

            [[targets]]
            name = "db"
            address = "127.0.0.1:5432"
            probe = "raw_connect"

            [[targets]]
            name = "noop"
            address = "anything"
            probe = { custom = "true" }
            "#,
        )
        .unwrap();

        let monitor = Monitor::from_config(&config, None).unwrap();
        assert_eq!(monitor.targets().count(), 2);
        assert_eq!(monitor.settings().shutdown_timeout, Duration::from_secs(10));
    }
}
