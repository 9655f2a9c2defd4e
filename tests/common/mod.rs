//! Common utilities for integration tests
#![allow(dead_code)]

use http_tunnel::acl::AclStore;
use http_tunnel::config::ServerConfig;
use http_tunnel::server;
use std::net::TcpListener;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener as TokioTcpListener, TcpStream};
use tokio::time::sleep;

/// Find an available port
pub fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to random port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Build a unique temp file path for an ACL config file
pub fn unique_acl_path(tag: &str) -> PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64;
    let counter = COUNTER.fetch_add(1, Ordering::SeqCst);

    std::env::temp_dir().join(format!(
        "http-tunnel-test-{}-{}-{}-{}.json",
        tag,
        timestamp,
        counter,
        std::process::id()
    ))
}

/// Remove temp files when the test ends
pub struct TestCleanup {
    paths: Vec<PathBuf>,
}

impl TestCleanup {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl Drop for TestCleanup {
    fn drop(&mut self) {
        for path in &self.paths {
            std::fs::remove_file(path).ok();
        }
    }
}

/// Create a simple echo server for testing
pub async fn start_echo_server(port: u16) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let listener = TokioTcpListener::bind(format!("127.0.0.1:{}", port))
            .await
            .expect("Failed to bind echo server");

        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        loop {
                            match socket.read(&mut buf).await {
                                Ok(0) => break, // Connection closed
                                Ok(n) => {
                                    if socket.write_all(&buf[..n]).await.is_err() {
                                        break;
                                    }
                                }
                                Err(_) => break,
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    })
}

/// Start a tunnel server on a fresh port, returning the port and its task
pub async fn start_tunnel_server(
    store: AclStore,
    acl_path: PathBuf,
    with_api: bool,
    connect_timeout_secs: u64,
) -> (u16, tokio::task::JoinHandle<()>) {
    let port = get_available_port();
    let config = ServerConfig::new(
        format!("127.0.0.1:{}", port),
        acl_path,
        with_api,
        connect_timeout_secs,
    )
    .expect("Failed to build server config");

    let handle = tokio::spawn(async move {
        server::run_server(config, store).await.ok();
    });

    sleep(Duration::from_millis(300)).await;
    (port, handle)
}

/// Read from the stream until the end of an HTTP response head
pub async fn read_response_head(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            return buf;
        }
        match stream.read(&mut chunk).await {
            Ok(0) => return buf,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(_) => return buf,
        }
    }
}

/// Send a raw HTTP request and collect the whole response until EOF
pub async fn send_raw_request(port: u16, request: &str) -> String {
    let mut stream = TcpStream::connect(format!("127.0.0.1:{}", port))
        .await
        .expect("Failed to connect to server");

    stream
        .write_all(request.as_bytes())
        .await
        .expect("Failed to write request");

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("Failed to read response");

    String::from_utf8_lossy(&response).into_owned()
}

/// Extract the status code from a raw HTTP response
pub fn status_code(response: &str) -> u16 {
    response
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .unwrap_or(0)
}

/// Extract the body (bytes after the blank line) from a raw HTTP response
pub fn response_body(response: &str) -> &str {
    response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body)
        .unwrap_or("")
}
