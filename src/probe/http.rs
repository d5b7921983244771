//! HTTP health check probe.

use async_trait::async_trait;
use std::error::Error as StdError;
use std::io;
use std::time::{Duration, Instant};

use crate::config::{HttpProbeConfig, StatusPolicy};
use crate::probe::{classify_io, FailureCause, ProbeError, ProbeOutcome, Prober};
use crate::target::Target;

/// Reachable iff a GET completes and the status is accepted by the
/// configured `StatusPolicy`.
///
/// One client is shared by every HTTP target. Its idle pool is bounded per
/// host so many targets cannot grow it without limit.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
    accept: StatusPolicy,
    timeout: Duration,
}

impl HttpProber {
    /// Build the shared client. Fails only if the TLS backend cannot initialize.
    pub fn new(timeout: Duration, config: &HttpProbeConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .user_agent(config.user_agent.clone());
        if config.no_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
            accept: config.accept.clone(),
            timeout,
        })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn check(&self, target: &Target) -> ProbeOutcome {
        let start = Instant::now();

        // The client timeout covers the whole exchange; the outer guard keeps
        // the bound even if a resolver ignores it.
        let request = self.client.get(target.address.as_str()).send();
        let response = match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                let cause = classify_reqwest(&e);
                tracing::debug!(target_name = %target.name, %cause, error = %e, "HTTP probe failed");
                return ProbeOutcome::down(ProbeError::new(cause, e.to_string()), start.elapsed());
            }
            Err(_) => {
                tracing::debug!(target_name = %target.name, "HTTP probe timed out");
                return ProbeOutcome::down(ProbeError::timed_out(self.timeout), start.elapsed());
            }
        };

        let status = response.status();
        if self.accept.accepts(status.as_u16()) {
            ProbeOutcome::up(start.elapsed())
        } else {
            tracing::debug!(target_name = %target.name, %status, "HTTP probe rejected status");
            ProbeOutcome::down(
                ProbeError::new(
                    FailureCause::ProtocolError,
                    format!("unexpected status {}", status),
                ),
                start.elapsed(),
            )
        }
    }
}

fn classify_reqwest(err: &reqwest::Error) -> FailureCause {
    if err.is_timeout() {
        return FailureCause::Timeout;
    }

    let mut source = err.source();
    while let Some(e) = source {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            match classify_io(io_err) {
                FailureCause::Other => {}
                cause => return cause,
            }
        }
        let text = e.to_string().to_ascii_lowercase();
        if text.contains("tls") || text.contains("certificate") || text.contains("handshake") {
            return FailureCause::ProtocolError;
        }
        source = e.source();
    }

    if err.is_connect() {
        FailureCause::Other
    } else if err.is_request() || err.is_body() || err.is_decode() || err.is_redirect() {
        FailureCause::ProtocolError
    } else {
        FailureCause::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::ProbeKind;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `status_line` to every connection.
    async fn serve(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                        status_line
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{}/health", addr)
    }

    fn prober(accept: StatusPolicy) -> HttpProber {
        let config = HttpProbeConfig {
            accept,
            no_proxy: true,
            ..HttpProbeConfig::default()
        };
        HttpProber::new(Duration::from_secs(2), &config).unwrap()
    }

    fn target(url: String) -> Target {
        Target::new("web", url, ProbeKind::Http, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_http_probe_success() {
        let url = serve("204 No Content").await;
        let outcome = prober(StatusPolicy::Success).check(&target(url)).await;
        assert!(outcome.is_reachable());
    }

    #[tokio::test]
    async fn test_http_probe_policy_narrowed() {
        let url = serve("204 No Content").await;
        let outcome = prober(StatusPolicy::Codes(vec![200])).check(&target(url)).await;
        assert!(!outcome.is_reachable());
        assert_eq!(outcome.cause(), Some(FailureCause::ProtocolError));
    }

    #[tokio::test]
    async fn test_http_probe_server_error() {
        let url = serve("503 Service Unavailable").await;
        let outcome = prober(StatusPolicy::Success).check(&target(url)).await;
        assert!(!outcome.is_reachable());
        assert!(outcome.error().unwrap().message.contains("503"));
    }

    #[tokio::test]
    async fn test_http_probe_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let outcome = prober(StatusPolicy::Success)
            .check(&target(format!("http://{}/", addr)))
            .await;
        assert!(!outcome.is_reachable());
        assert_eq!(outcome.cause(), Some(FailureCause::Refused));
    }
}
