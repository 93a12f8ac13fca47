//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use mock_proxy::config::EngineConfig;
use mock_proxy::control::{ClientRegistry, ControlChannel};
use mock_proxy::lifecycle::Shutdown;
use mock_proxy::HttpServer;

/// A captured origin-side request: request line, then body.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub request_line: String,
    pub headers: Vec<String>,
    pub body: Vec<u8>,
}

/// Start a simple origin server that returns a fixed response body.
pub async fn start_origin(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 8192];
                        let _ = socket.read(&mut buf).await;

                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            response.len(),
                            response
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

    addr
}

/// Start an origin server that records every request it sees.
#[allow(dead_code)]
pub async fn start_recording_origin(seen: Arc<Mutex<Vec<SeenRequest>>>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let seen = seen.clone();
                    tokio::spawn(async move {
                        let mut raw = Vec::new();
                        let mut buf = [0u8; 8192];

                        // Read the head, then exactly Content-Length body bytes.
                        let (head_end, content_length) = loop {
                            let n = match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => n,
                            };
                            raw.extend_from_slice(&buf[..n]);

                            if let Some(pos) = find_head_end(&raw) {
                                let head = String::from_utf8_lossy(&raw[..pos]);
                                let content_length = head
                                    .lines()
                                    .find_map(|line| {
                                        let (name, value) = line.split_once(':')?;
                                        name.eq_ignore_ascii_case("content-length")
                                            .then(|| value.trim().parse::<usize>().ok())?
                                    })
                                    .unwrap_or(0);
                                break (pos + 4, content_length);
                            }
                        };

                        while raw.len() < head_end + content_length {
                            let n = match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => n,
                            };
                            raw.extend_from_slice(&buf[..n]);
                        }

                        let head = String::from_utf8_lossy(&raw[..head_end - 4]);
                        let mut lines = head.lines();
                        let request_line = lines.next().unwrap_or_default().to_string();
                        let headers: Vec<String> = lines.map(str::to_string).collect();
                        let body = raw[head_end..].to_vec();

                        seen.lock().unwrap().push(SeenRequest {
                            request_line,
                            headers,
                            body,
                        });

                        let _ = socket
                            .write_all(
                                b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
                            )
                            .await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

fn find_head_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Engine handles shared by the integration tests.
pub struct TestEngine {
    pub proxy_addr: SocketAddr,
    pub control: ControlChannel,
    pub clients: Arc<ClientRegistry>,
    pub shutdown: Arc<Shutdown>,
}

/// Config with test-sized timers (fallback 200ms, safety net 600ms).
pub fn test_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.timeouts.fallback_delay_ms = 200;
    config.timeouts.response_timeout_ms = 600;
    config
}

/// Bind an ephemeral port and run the engine on it.
pub async fn spawn_engine(mut config: EngineConfig) -> TestEngine {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy_addr = listener.local_addr().unwrap();
    config.listener.bind_address = proxy_addr.to_string();

    let server = HttpServer::new(config);
    let control = server.control();
    let clients = server.clients();
    let shutdown = server.shutdown_handle();

    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    TestEngine {
        proxy_addr,
        control,
        clients,
        shutdown,
    }
}

/// HTTP client whose traffic is intercepted by the engine.
pub fn proxied_client(proxy: SocketAddr) -> reqwest::Client {
    reqwest::Client::builder()
        .proxy(reqwest::Proxy::http(format!("http://{}", proxy)).unwrap())
        .build()
        .unwrap()
}
