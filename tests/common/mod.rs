//! Shared utilities for integration tests.

use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use async_trait::async_trait;
use uptime_monitor::{
    FailureCause, ProbeError, ProbeOutcome, Prober, RemediationError, RemediationHook,
    StatusEvent, Target,
};

/// Start a programmable mock backend; `f` picks the status code per request.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = u16> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 1024];
                        let _ = socket.read(&mut buf).await;
                        let status_text = match f().await {
                            200 => "200 OK",
                            204 => "204 No Content",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                            status_text
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// Start a backend that accepts connections and never answers.
#[allow(dead_code)]
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// Prober that replays a script of outcomes, then repeats the last one.
#[allow(dead_code)]
pub struct ScriptedProber {
    script: Mutex<VecDeque<bool>>,
    last: Mutex<bool>,
    delay: Duration,
}

#[allow(dead_code)]
impl ScriptedProber {
    pub fn new(script: &[bool]) -> Self {
        Self::with_delay(script, Duration::ZERO)
    }

    pub fn with_delay(script: &[bool], delay: Duration) -> Self {
        Self {
            script: Mutex::new(script.iter().copied().collect()),
            last: Mutex::new(script.last().copied().unwrap_or(true)),
            delay,
        }
    }

    pub fn always(reachable: bool) -> Self {
        Self::new(&[reachable])
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn check(&self, _target: &Target) -> ProbeOutcome {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        let reachable = next.unwrap_or(*self.last.lock().unwrap());
        if reachable {
            ProbeOutcome::up(self.delay)
        } else {
            ProbeOutcome::down(
                ProbeError::new(FailureCause::Refused, "scripted failure"),
                self.delay,
            )
        }
    }
}

/// Hook that records the names of targets it was called for.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingHook {
    pub calls: Mutex<Vec<String>>,
    pub count: AtomicUsize,
}

#[allow(dead_code)]
impl RecordingHook {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemediationHook for RecordingHook {
    async fn on_down(&self, target: &Target) -> Result<(), RemediationError> {
        self.calls.lock().unwrap().push(target.name.clone());
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Receive events for `window`, returning everything seen.
#[allow(dead_code)]
pub async fn collect_for(
    rx: &mut broadcast::Receiver<StatusEvent>,
    window: Duration,
) -> Vec<StatusEvent> {
    let mut events = Vec::new();
    let deadline = tokio::time::Instant::now() + window;
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Ok(event)) => events.push(event),
            Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
            Ok(Err(broadcast::error::RecvError::Closed)) | Err(_) => break,
        }
    }
    events
}

/// Receive exactly `n` events for `name`, failing after `timeout`.
#[allow(dead_code)]
pub async fn next_events(
    rx: &mut broadcast::Receiver<StatusEvent>,
    name: &str,
    n: usize,
    timeout: Duration,
) -> Vec<StatusEvent> {
    let mut events = Vec::new();
    let deadline = tokio::time::Instant::now() + timeout;
    while events.len() < n {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Ok(event)) if event.target == name => events.push(event),
            Ok(Ok(_)) => {}
            Ok(Err(e)) => panic!("event channel error: {}", e),
            Err(_) => panic!("timed out waiting for {} events for {}, got {}", n, name, events.len()),
        }
    }
    events
}
