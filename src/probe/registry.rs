//! Probe kind → prober mapping.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{CommandProbeConfig, ProbeSettings};
use crate::probe::{CommandProber, HttpProber, Prober, TcpProber};
use crate::target::ProbeKind;

/// Maps each `ProbeKind` to the prober that serves it.
///
/// Probers are shared by every target of their kind, so they must be safe
/// for concurrent use.
#[derive(Clone, Default)]
pub struct ProberRegistry {
    probers: HashMap<ProbeKind, Arc<dyn Prober>>,
}

impl ProberRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the raw-connect and HTTP probers configured from `settings`.
    pub fn with_defaults(settings: &ProbeSettings) -> Result<Self, reqwest::Error> {
        let timeout = settings.timeout();
        let mut registry = Self::new();
        registry.register(ProbeKind::RawConnect, TcpProber::new(timeout));
        registry.register(ProbeKind::Http, HttpProber::new(timeout, &settings.http)?);
        Ok(registry)
    }

    /// Register `prober` for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: ProbeKind, prober: impl Prober + 'static) -> &mut Self {
        self.probers.insert(kind, Arc::new(prober));
        self
    }

    /// Register a custom prober referenced as `ProbeKind::Custom(name)`.
    pub fn register_custom(
        &mut self,
        name: impl Into<String>,
        prober: impl Prober + 'static,
    ) -> &mut Self {
        self.register(ProbeKind::Custom(name.into()), prober)
    }

    /// Register a command prober for each configured entry.
    pub fn register_commands(
        &mut self,
        commands: &[CommandProbeConfig],
        settings: &ProbeSettings,
    ) -> &mut Self {
        for command in commands {
            self.register_custom(
                command.name.clone(),
                CommandProber::from_config(command, settings.timeout()),
            );
        }
        self
    }

    pub fn get(&self, kind: &ProbeKind) -> Option<Arc<dyn Prober>> {
        self.probers.get(kind).cloned()
    }

    pub fn contains(&self, kind: &ProbeKind) -> bool {
        self.probers.contains_key(kind)
    }
}

impl std::fmt::Debug for ProberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProberRegistry")
            .field("kinds", &self.probers.keys().collect::<Vec<_>>())
            .finish()
    }
}
