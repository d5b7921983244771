//! Raw TCP reachability probe.

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::probe::{ProbeError, ProbeOutcome, Prober};
use crate::target::Target;

/// Reachable iff a TCP connection to `host:port` can be established.
///
/// The stream is dropped as soon as the handshake completes so no descriptor
/// outlives the check.
#[derive(Debug, Clone)]
pub struct TcpProber {
    timeout: Duration,
}

impl TcpProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn check(&self, target: &Target) -> ProbeOutcome {
        let start = Instant::now();
        let connect = TcpStream::connect(target.address.as_str());

        match timeout(self.timeout, connect).await {
            Ok(Ok(stream)) => {
                drop(stream);
                ProbeOutcome::up(start.elapsed())
            }
            Ok(Err(e)) => {
                tracing::debug!(target_name = %target.name, error = %e, "TCP probe failed");
                ProbeOutcome::down(ProbeError::from_io(&e), start.elapsed())
            }
            Err(_) => {
                tracing::debug!(target_name = %target.name, "TCP probe timed out");
                ProbeOutcome::down(ProbeError::timed_out(self.timeout), start.elapsed())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::FailureCause;
    use crate::target::ProbeKind;
    use tokio::net::TcpListener;

    fn target(address: String) -> Target {
        Target::new("tcp", address, ProbeKind::RawConnect, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_tcp_probe_up() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let prober = TcpProber::new(Duration::from_secs(1));
        let outcome = prober.check(&target(addr.to_string())).await;
        assert!(outcome.is_reachable());
    }

    #[tokio::test]
    async fn test_tcp_probe_refused() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let prober = TcpProber::new(Duration::from_secs(1));
        let outcome = prober.check(&target(addr.to_string())).await;
        assert!(!outcome.is_reachable());
        assert_eq!(outcome.cause(), Some(FailureCause::Refused));
    }
}
