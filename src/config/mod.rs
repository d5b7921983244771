//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → MonitorConfig (validated, immutable)
//!     → TargetConfig::to_target() → Monitor::new
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the target set is fixed for the process
//! - All fields except the target list have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The monitor core never reads files; it only sees `Target` values

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    CommandProbeConfig, HttpProbeConfig, MonitorConfig, ObservabilityConfig, ProbeSettings,
    RemediationConfig, ScheduleMode, SchedulerConfig, StatusPolicy, TargetConfig,
};
pub use validation::ValidationError;
