//! uptime-monitor
//!
//! Polls every configured target on its own interval and reports status
//! changes.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                          MONITOR                                 │
//!   │                                                                  │
//!   │  ┌───────────┐   tick   ┌──────────┐  outcome  ┌──────────────┐  │
//!   │  │ scheduler │─────────▶│  probe   │──────────▶│    status    │  │
//!   │  │ (1 task / │          │ tcp/http │           │   tracker    │  │
//!   │  │  target)  │◀─────────│ /custom  │           └──────┬───────┘  │
//!   │  └───────────┘   wait   └──────────┘                  │          │
//!   │                                          ┌────────────┴───────┐  │
//!   │                                          ▼                    ▼  │
//!   │                                  ┌──────────────┐  ┌───────────┐ │
//!   │                                  │ StatusEvent  │  │remediation│ │
//!   │                                  │  broadcast   │  │ dispatcher│ │
//!   │                                  └──────┬───────┘  └─────┬─────┘ │
//!   └─────────────────────────────────────────┼────────────────┼───────┘
//!                                             ▼                ▼
//!                                       event logger    RemediationHook
//! ```

use async_trait::async_trait;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;

use uptime_monitor::config::load_config;
use uptime_monitor::lifecycle::signals::shutdown_signal;
use uptime_monitor::observability::{logging, metrics};
use uptime_monitor::{Monitor, RemediationError, RemediationHook, Status, StatusEvent, Target};

#[derive(Parser)]
#[command(name = "uptime-monitor")]
#[command(about = "Poll services and endpoints and report when they go down", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Override the configured log level.
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,

    /// Print every status event to stdout as a JSON line.
    #[arg(long)]
    json: bool,
}

/// Records what a remediation collaborator would be asked to do.
struct LogRemediation;

#[async_trait]
impl RemediationHook for LogRemediation {
    async fn on_down(&self, target: &Target) -> Result<(), RemediationError> {
        let Some(remediation) = target.remediation.as_ref() else {
            tracing::debug!(target_name = %target.name, "No remediation configured, skipping");
            return Ok(());
        };

        tracing::warn!(
            target_name = %target.name,
            image = %remediation.image,
            command = remediation.command.as_deref().unwrap_or("-"),
            "Remediation requested: deploy local copy"
        );
        Ok(())
    }
}

async fn log_events(mut events: broadcast::Receiver<StatusEvent>, json: bool) {
    loop {
        match events.recv().await {
            Ok(event) if json => match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::error!(error = %e, "Failed to serialize status event"),
            },
            Ok(event) => log_event(&event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event logger lagged behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn log_event(event: &StatusEvent) {
    let latency_ms = event.latency.as_millis() as u64;
    let error = event.error.as_ref().map(|e| e.to_string()).unwrap_or_default();

    match (event.is_transition, event.status) {
        (true, Status::Down) => tracing::warn!(
            service = %event.target,
            at = %event.observed_at.to_rfc2822(),
            error = %error,
            "Service is down"
        ),
        (true, _) => tracing::info!(
            service = %event.target,
            at = %event.observed_at.to_rfc2822(),
            latency_ms,
            "Service is up"
        ),
        (false, _) => tracing::debug!(
            service = %event.target,
            status = %event.status,
            latency_ms,
            error = %error,
            "Status"
        ),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(config.observability.log_level.as_str())
        .to_string();
    logging::init_logging(&level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        path = %cli.config.display(),
        targets = config.targets.len(),
        "Configuration loaded"
    );

    let hook: Arc<dyn RemediationHook> = Arc::new(LogRemediation);
    let monitor = Monitor::from_config(&config, Some(hook))?;
    if cli.check {
        for target in monitor.targets() {
            println!(
                "{}\t{}\t{}\t{}s",
                target.name,
                target.probe_kind,
                target.address,
                target.interval.as_secs()
            );
        }
        return Ok(());
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let logger = tokio::spawn(log_events(monitor.subscribe(), cli.json));
    let report = monitor.run_until(shutdown_signal()).await;
    let _ = logger.await;

    if !report.aborted.is_empty() {
        tracing::warn!(aborted = ?report.aborted, "Some targets were aborted during shutdown");
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
