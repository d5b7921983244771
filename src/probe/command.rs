//! External command probe.
//!
//! Runs a program per check; exit status 0 means up. Used for checks the
//! monitor cannot express natively, e.g. `ping -c 1 {address}`.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::CommandProbeConfig;
use crate::probe::{FailureCause, ProbeError, ProbeOutcome, Prober};
use crate::target::Target;

const ADDRESS_PLACEHOLDER: &str = "{address}";

/// Probe that shells out to an external program.
#[derive(Debug, Clone)]
pub struct CommandProber {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandProber {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &CommandProbeConfig, timeout: Duration) -> Self {
        Self::new(config.program.clone(), config.args.clone(), timeout)
    }

    fn args_for(&self, target: &Target) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(ADDRESS_PLACEHOLDER, &target.address))
            .collect()
    }
}

#[async_trait]
impl Prober for CommandProber {
    async fn check(&self, target: &Target) -> ProbeOutcome {
        let start = Instant::now();

        // kill_on_drop reaps the child when the timeout drops the future.
        let status = Command::new(&self.program)
            .args(self.args_for(target))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        match timeout(self.timeout, status).await {
            Ok(Ok(status)) if status.success() => ProbeOutcome::up(start.elapsed()),
            Ok(Ok(status)) => ProbeOutcome::down(
                ProbeError::new(
                    FailureCause::ProtocolError,
                    format!("{} exited with {}", self.program, status),
                ),
                start.elapsed(),
            ),
            Ok(Err(e)) => {
                tracing::warn!(target_name = %target.name, program = %self.program, error = %e, "Failed to run probe command");
                ProbeOutcome::down(
                    ProbeError::new(FailureCause::Other, format!("spawn {}: {}", self.program, e)),
                    start.elapsed(),
                )
            }
            Err(_) => ProbeOutcome::down(ProbeError::timed_out(self.timeout), start.elapsed()),
        }
    }
}
