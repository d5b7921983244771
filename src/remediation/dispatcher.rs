//! Asynchronous hand-off from polling loops to the remediation hook.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::observability::metrics;
use crate::remediation::RemediationHook;
use crate::target::Target;

/// Cloneable sender side of the remediation queue.
///
/// The worker exits once every dispatcher clone is dropped and the queue is
/// drained.
#[derive(Debug, Clone)]
pub struct RemediationDispatcher {
    tx: mpsc::Sender<Arc<Target>>,
}

impl RemediationDispatcher {
    /// Spawn the worker that feeds `hook`.
    pub fn spawn(hook: Arc<dyn RemediationHook>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(hook, rx));
        (Self { tx }, worker)
    }

    /// Queue a remediation request without waiting. Returns false if it was dropped.
    pub fn dispatch(&self, target: &Arc<Target>) -> bool {
        match self.tx.try_send(target.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(target_name = %target.name, "Remediation queue full, dropping request");
                metrics::record_remediation(&target.name, "dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!(target_name = %target.name, "Remediation worker stopped, dropping request");
                metrics::record_remediation(&target.name, "dropped");
                false
            }
        }
    }
}

async fn run_worker(hook: Arc<dyn RemediationHook>, mut rx: mpsc::Receiver<Arc<Target>>) {
    while let Some(target) = rx.recv().await {
        let name = target.name.clone();
        tracing::info!(
            target_name = %name,
            image = target.remediation.as_ref().map(|r| r.image.as_str()).unwrap_or("-"),
            "Invoking remediation hook"
        );

        // A separate task keeps a panicking hook from killing the worker.
        let hook = hook.clone();
        let result = tokio::spawn(async move { hook.on_down(&target).await }).await;

        match result {
            Ok(Ok(())) => {
                metrics::record_remediation(&name, "ok");
            }
            Ok(Err(e)) => {
                tracing::error!(target_name = %name, error = %e, "Remediation hook failed");
                metrics::record_remediation(&name, "error");
            }
            Err(e) => {
                tracing::error!(target_name = %name, error = %e, "Remediation hook panicked");
                metrics::record_remediation(&name, "panic");
            }
        }
    }
    tracing::debug!("Remediation worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remediation::RemediationError;
    use crate::target::ProbeKind;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RemediationHook for Recorder {
        async fn on_down(&self, target: &Target) -> Result<(), RemediationError> {
            self.calls.lock().unwrap().push(target.name.clone());
            if target.name == "panics" {
                panic!("hook blew up");
            }
            if target.name == "fails" {
                return Err(RemediationError::Failed("image missing".into()));
            }
            Ok(())
        }
    }

    fn target(name: &str) -> Arc<Target> {
        Arc::new(Target::new(name, "127.0.0.1:1", ProbeKind::RawConnect, Duration::from_secs(1)))
    }

    #[tokio::test]
    async fn test_hook_failures_are_isolated() {
        let recorder = Arc::new(Recorder::default());
        let (dispatcher, worker) = RemediationDispatcher::spawn(recorder.clone(), 8);

        assert!(dispatcher.dispatch(&target("fails")));
        assert!(dispatcher.dispatch(&target("panics")));
        assert!(dispatcher.dispatch(&target("ok")));
        drop(dispatcher);

        worker.await.unwrap();
        let calls = recorder.calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["fails", "panics", "ok"]);
    }

    struct Blocking;

    #[async_trait]
    impl RemediationHook for Blocking {
        async fn on_down(&self, _target: &Target) -> Result<(), RemediationError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let (dispatcher, worker) = RemediationDispatcher::spawn(Arc::new(Blocking), 1);
        let t = target("slow");

        // The worker holds at most one in flight; the queue holds one more.
        let accepted = (0..5).filter(|_| dispatcher.dispatch(&t)).count();
        assert!(accepted >= 1 && accepted <= 2);
        worker.abort();
    }
}
