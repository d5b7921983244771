//! Closure-backed custom probes.

use async_trait::async_trait;
use std::future::Future;

use crate::probe::{ProbeOutcome, Prober};
use crate::target::Target;

/// Adapts an async closure into a `Prober`, for application-level checks
/// that do not deserve their own type.
///
/// ```ignore
/// let prober = FnProber::new(|target: Target| async move {
///     redis_ping(&target.address).await
/// });
/// registry.register_custom("redis", prober);
/// ```
pub struct FnProber<F> {
    check: F,
}

impl<F> FnProber<F> {
    pub fn new(check: F) -> Self {
        Self { check }
    }
}

#[async_trait]
impl<F, Fut> Prober for FnProber<F>
where
    F: Fn(Target) -> Fut + Send + Sync,
    Fut: Future<Output = ProbeOutcome> + Send,
{
    async fn check(&self, target: &Target) -> ProbeOutcome {
        (self.check)(target.clone()).await
    }
}
