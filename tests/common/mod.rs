//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use waf_gateway::{GatewayConfig, GatewayServer};

/// Spawn a gateway on an ephemeral port and return its address.
pub async fn spawn_gateway(config: GatewayConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = GatewayServer::new(config);
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
    // Give the accept loop a beat to come up.
    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

/// A gateway config suitable for tests: temp audit log, short timeouts.
pub fn test_config(map_path: &std::path::Path, log_path: &std::path::Path) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.proxy.map_path = map_path.to_string_lossy().into_owned();
    config.audit.log_path = log_path.to_string_lossy().into_owned();
    config.proxy.timeout_secs = 2;
    config.timeouts.request_secs = 10;
    config
}

/// HTTP client that talks straight to the local gateway.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
}

/// Start a mock origin that answers every request with a fixed response,
/// including hop-by-hop headers the gateway must strip.
#[allow(dead_code)]
pub async fn start_static_origin(body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let _ = read_request_head(&mut socket).await;
                        let response = format!(
                            "HTTP/1.1 200 OK\r\n\
                             Content-Length: {}\r\n\
                             Content-Type: text/plain\r\n\
                             X-Upstream-Marker: yes\r\n\
                             Connection: close\r\n\
                             Keep-Alive: timeout=5\r\n\
                             \r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a mock origin that echoes the received request head (request line
/// plus headers) back as the response body, so tests can assert on what the
/// gateway actually sent upstream.
#[allow(dead_code)]
pub async fn start_capture_origin() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let head = read_request_head(&mut socket).await.unwrap_or_default();
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            head.len(),
                            head
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a mock origin that accepts connections but never responds.
#[allow(dead_code)]
pub async fn start_hanging_origin() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let _ = read_request_head(&mut socket).await;
                        tokio::time::sleep(Duration::from_secs(120)).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Read until the end of the request head (blank line).
#[allow(dead_code)]
async fn read_request_head(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
                if buf.len() > 64 * 1024 {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    let text = String::from_utf8_lossy(&buf);
    let head = text.split("\r\n\r\n").next().unwrap_or_default();
    Some(head.to_string())
}
