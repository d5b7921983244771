//! Remediation trigger contract.
//!
//! # Data Flow
//! ```text
//! StatusTracker sees a down transition
//!     → dispatcher.rs (non-blocking enqueue on a bounded queue)
//!     → worker task
//!     → RemediationHook::on_down(target) in its own task
//!     → errors and panics logged, never propagated
//! ```
//!
//! # Design Decisions
//! - The core only decides *when* to remediate; the hook decides *how*
//! - A full queue drops the request instead of blocking a polling loop
//! - Invocations run one at a time, in dispatch order

pub mod dispatcher;

use async_trait::async_trait;
use thiserror::Error;

use crate::target::Target;

pub use dispatcher::RemediationDispatcher;

/// Failure reported by a remediation hook.
#[derive(Debug, Error)]
pub enum RemediationError {
    /// The target has nothing the hook can act on.
    #[error("no remediation configured for '{0}'")]
    NotConfigured(String),

    /// The corrective action ran and failed.
    #[error("remediation failed: {0}")]
    Failed(String),
}

/// External collaborator invoked when a target goes down.
#[async_trait]
pub trait RemediationHook: Send + Sync {
    async fn on_down(&self, target: &Target) -> Result<(), RemediationError>;
}
