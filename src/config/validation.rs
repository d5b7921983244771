//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check target names are present and unique
//! - Validate value ranges (intervals, timeouts, capacities > 0)
//! - Check addresses are well-formed for their probe kind
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function over the parsed values
//! - Runs before the monitor is constructed, never mid-run

use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::schema::MonitorConfig;
use crate::target::{ProbeKind, Target};

/// A single semantic configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no targets configured")]
    NoTargets,

    #[error("target #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("duplicate target name '{0}'")]
    DuplicateName(String),

    #[error("target '{0}' has a zero check interval")]
    ZeroInterval(String),

    #[error("target '{name}' has invalid address '{address}' for {kind}: {reason}")]
    InvalidAddress {
        name: String,
        address: String,
        kind: ProbeKind,
        reason: String,
    },

    #[error("target '{name}' uses probe kind {kind} with no registered prober")]
    UnknownProbeKind { name: String, kind: ProbeKind },

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("custom probe #{index} has an empty name or program")]
    InvalidCustomProbe { index: usize },

    #[error("duplicate custom probe name '{0}'")]
    DuplicateCustomProbe(String),
}

/// Validate a target list independent of which probers are registered.
pub fn validate_targets(targets: &[Target]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if targets.is_empty() {
        errors.push(ValidationError::NoTargets);
        return errors;
    }

    let mut seen = HashSet::new();
    for (index, target) in targets.iter().enumerate() {
        if target.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName { index });
        } else if !seen.insert(target.name.as_str()) {
            errors.push(ValidationError::DuplicateName(target.name.clone()));
        }

        if target.interval == Duration::ZERO {
            errors.push(ValidationError::ZeroInterval(target.name.clone()));
        }

        if let Err(reason) = check_address(&target.probe_kind, &target.address) {
            errors.push(ValidationError::InvalidAddress {
                name: target.name.clone(),
                address: target.address.clone(),
                kind: target.probe_kind.clone(),
                reason,
            });
        }
    }
    errors
}

fn check_address(kind: &ProbeKind, address: &str) -> Result<(), String> {
    match kind {
        ProbeKind::RawConnect => {
            let (host, port) = address
                .rsplit_once(':')
                .ok_or_else(|| "expected host:port".to_string())?;
            if host.is_empty() || host == "[]" {
                return Err("missing host".to_string());
            }
            let bracketed = host.starts_with('[') && host.ends_with(']');
            if host.contains(':') && !bracketed {
                return Err(format!("IPv6 host '{}' must be bracketed", host));
            }
            port.parse::<u16>()
                .map(|_| ())
                .map_err(|_| format!("invalid port '{}'", port))
        }
        ProbeKind::Http => {
            let url = Url::parse(address).map_err(|e| e.to_string())?;
            match url.scheme() {
                "http" | "https" => Ok(()),
                other => Err(format!("unsupported scheme '{}'", other)),
            }
        }
        ProbeKind::Custom(_) => {
            if address.trim().is_empty() {
                Err("empty address".to_string())
            } else {
                Ok(())
            }
        }
    }
}

/// Validate a parsed configuration file.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let targets: Vec<Target> = config.targets.iter().map(|t| t.to_target()).collect();
    let mut errors = validate_targets(&targets);

    if config.probes.timeout_ms == 0 {
        errors.push(ValidationError::ZeroValue("probes.timeout_ms"));
    }
    if config.scheduler.shutdown_timeout_ms == 0 {
        errors.push(ValidationError::ZeroValue("scheduler.shutdown_timeout_ms"));
    }
    if config.scheduler.event_capacity == 0 {
        errors.push(ValidationError::ZeroValue("scheduler.event_capacity"));
    }
    if config.remediation.queue_capacity == 0 {
        errors.push(ValidationError::ZeroValue("remediation.queue_capacity"));
    }
    if config.remediation.retrigger_after == Some(0) {
        errors.push(ValidationError::ZeroValue("remediation.retrigger_after"));
    }

    let mut names = HashSet::new();
    for (index, probe) in config.custom_probes.iter().enumerate() {
        if probe.name.trim().is_empty() || probe.program.trim().is_empty() {
            errors.push(ValidationError::InvalidCustomProbe { index });
        } else if !names.insert(probe.name.as_str()) {
            errors.push(ValidationError::DuplicateCustomProbe(probe.name.clone()));
        }
    }

    for target in &config.targets {
        if let ProbeKind::Custom(name) = &target.probe {
            if !names.contains(name.as_str()) {
                errors.push(ValidationError::UnknownProbeKind {
                    name: target.name.clone(),
                    kind: target.probe.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{CommandProbeConfig, TargetConfig};

    fn target(name: &str, address: &str, kind: ProbeKind, secs: u64) -> Target {
        Target::new(name, address, kind, Duration::from_secs(secs))
    }

    #[test]
    fn test_empty_target_set() {
        assert_eq!(validate_targets(&[]), vec![ValidationError::NoTargets]);
    }

    #[test]
    fn test_collects_all_errors() {
        let targets = vec![
            target("a", "127.0.0.1:80", ProbeKind::RawConnect, 1),
            target("a", "127.0.0.1:81", ProbeKind::RawConnect, 1),
            target("", "127.0.0.1:82", ProbeKind::RawConnect, 1),
            target("zero", "127.0.0.1:83", ProbeKind::RawConnect, 0),
        ];
        let errors = validate_targets(&targets);
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::DuplicateName("a".into())));
        assert!(errors.contains(&ValidationError::EmptyName { index: 2 }));
        assert!(errors.contains(&ValidationError::ZeroInterval("zero".into())));
    }

    #[test]
    fn test_address_checks() {
        let ok = vec![
            target("tcp", "example.com:443", ProbeKind::RawConnect, 1),
            target("web", "https://example.com/health", ProbeKind::Http, 1),
            target("ping", "10.0.0.1", ProbeKind::Custom("ping".into()), 1),
        ];
        assert!(validate_targets(&ok).is_empty());

        let bad = vec![
            target("no-port", "example.com", ProbeKind::RawConnect, 1),
            target("bad-port", "example.com:http", ProbeKind::RawConnect, 1),
            target("not-url", "example.com/health", ProbeKind::Http, 1),
            target("ftp", "ftp://example.com", ProbeKind::Http, 1),
        ];
        let errors = validate_targets(&bad);
        assert_eq!(errors.len(), 4);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ValidationError::InvalidAddress { .. })));
    }

    #[test]
    fn test_ipv6_hosts_must_be_bracketed() {
        let ok = vec![
            target("v6", "[::1]:80", ProbeKind::RawConnect, 1),
            target("v6-full", "[2001:db8::1]:5432", ProbeKind::RawConnect, 1),
        ];
        assert!(validate_targets(&ok).is_empty());

        let bad = vec![
            target("bare", "::1:80", ProbeKind::RawConnect, 1),
            target("empty", "[]:80", ProbeKind::RawConnect, 1),
        ];
        let errors = validate_targets(&bad);
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            &errors[0],
            ValidationError::InvalidAddress { name, reason, .. }
                if name == "bare" && reason.contains("bracketed")
        ));
    }

    #[test]
    fn test_validate_config_settings() {
        let mut config = MonitorConfig::default();
        config.targets.push(TargetConfig {
            name: "gw".into(),
            address: "10.0.0.1".into(),
            probe: ProbeKind::Custom("ping".into()),
            interval_secs: 5,
            remediation: None,
        });
        config.probes.timeout_ms = 0;
        config.remediation.retrigger_after = Some(0);

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ZeroValue("probes.timeout_ms")));
        assert!(errors.contains(&ValidationError::ZeroValue("remediation.retrigger_after")));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::UnknownProbeKind { .. })));

        config.probes.timeout_ms = 1000;
        config.remediation.retrigger_after = None;
        config.custom_probes.push(CommandProbeConfig {
            name: "ping".into(),
            program: "ping".into(),
            args: vec!["-c".into(), "1".into(), "{address}".into()],
        });
        assert!(validate_config(&config).is_ok());
    }
}
