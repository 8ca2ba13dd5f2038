//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agent_sidecar::config::ManagerConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Descriptor with two counters, shaped like the manager's config listing.
pub const DESCRIPTOR: &str = r#"[{"metadata": {"xappName": "kpimon"}, "config": {"measurements": [
    {"moId": "SubNetwork,ManagedElement=RIC", "measType": "X2", "measId": "8000",
     "measInterval": "60", "metrics": [
        {"name": "UE_Throughput", "objectName": "ueThroughput", "objectInstance": "ue", "counterId": "0011"},
        {"name": "Cell_Load", "objectName": "cellLoad", "objectInstance": "cell", "counterId": "0012"}
    ]}
]}}]"#;

/// Platform descriptor with one counter.
pub const PLATFORM_DESCRIPTOR: &str = r#"[{"config": {"measurements": [
    {"moId": "RIC", "measType": "platform", "measId": "9000", "measInterval": "30",
     "metrics": [{"name": "Pod_Restarts", "objectName": "pods", "objectInstance": "pod", "counterId": "0100"}]}
]}}]"#;

/// A manager stand-in answering each request with the next scripted
/// response; the last one repeats forever.
pub struct MockManager {
    pub addr: SocketAddr,
    attempts: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<String>>>,
}

impl MockManager {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of requests answered so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Request bodies in arrival order.
    pub fn bodies(&self) -> Vec<String> {
        self.bodies.lock().unwrap().clone()
    }

    /// Manager config pointing at this mock with short timeouts.
    pub fn config(&self) -> ManagerConfig {
        let mut config = ManagerConfig::default();
        config.base_url = self.base_url();
        config.subscribe_timeout_secs = 2;
        config.fetch_timeout_secs = 2;
        config.retry_interval_ms = 20;
        config
    }
}

/// Start a programmable mock manager on an ephemeral port.
pub async fn start_mock_manager(responses: Vec<(u16, &'static str)>) -> MockManager {
    assert!(!responses.is_empty());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let attempts = Arc::new(AtomicUsize::new(0));
    let bodies = Arc::new(Mutex::new(Vec::new()));
    let responses = Arc::new(responses);

    let counter = attempts.clone();
    let recorded = bodies.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let counter = counter.clone();
                    let recorded = recorded.clone();
                    let responses = responses.clone();
                    tokio::spawn(async move {
                        let body = read_request(&mut socket).await;
                        recorded.lock().unwrap().push(body);
                        let n = counter.fetch_add(1, Ordering::SeqCst);
                        let (status, body) = responses[n.min(responses.len() - 1)];

                        let response_str = format!(
                            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            reason(status),
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockManager {
        addr,
        attempts,
        bodies,
    }
}

/// Address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Read headers and a Content-Length body so the client never sees a reset.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = find(&buf, b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                return String::from_utf8_lossy(&buf[end + 4..end + 4 + length]).into_owned();
            }
        }
    }
    String::new()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

/// Poll `cond` until it holds or two seconds pass.
pub async fn wait_for(mut cond: impl FnMut() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
