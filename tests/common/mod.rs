//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use caching_proxy::config::ProxyConfig;
use caching_proxy::net::Listener;
use caching_proxy::{ProxyServer, ResponseCache, Shutdown};

/// A stub origin server that answers every connection with a fixed response
/// and closes, letting EOF delimit the body.
pub struct MockOrigin {
    pub addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MockOrigin {
    /// Number of connections the origin has accepted so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Raw request bytes (up to the end of the header section) seen per
    /// connection.
    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.requests.lock().unwrap().clone()
    }

    /// Absolute URI pointing at this origin.
    pub fn uri(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a stub origin returning `response` on every connection.
pub async fn start_mock_origin(response: Vec<u8>) -> MockOrigin {
    start_origin_with_chunks(vec![response], Duration::ZERO).await
}

/// Start a stub origin that writes `chunks` with `pause` between them before
/// closing, to exercise streaming relay.
pub async fn start_origin_with_chunks(chunks: Vec<Vec<u8>>, pause: Duration) -> MockOrigin {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));

    let accepted = Arc::clone(&connections);
    let seen = Arc::clone(&requests);
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    accepted.fetch_add(1, Ordering::SeqCst);
                    let chunks = chunks.clone();
                    let seen = Arc::clone(&seen);
                    tokio::spawn(async move {
                        let head = read_request_head(&mut socket).await;
                        seen.lock().unwrap().push(head);
                        for (i, chunk) in chunks.iter().enumerate() {
                            if i > 0 && !pause.is_zero() {
                                tokio::time::sleep(pause).await;
                            }
                            if socket.write_all(chunk).await.is_err() {
                                return;
                            }
                        }
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockOrigin {
        addr,
        connections,
        requests,
    }
}

async fn read_request_head(socket: &mut TcpStream) -> Vec<u8> {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        match socket.read(&mut byte).await {
            Ok(0) | Err(_) => break,
            Ok(_) => head.push(byte[0]),
        }
    }
    head
}

/// A proxy instance running on an ephemeral port.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub cache: Arc<ResponseCache>,
    // Dropping the coordinator stops the server; hold it for the test's life.
    _shutdown: Shutdown,
}

/// Start the proxy with `config`, forcing an ephemeral port and no metrics
/// exporter.
pub async fn start_proxy(mut config: ProxyConfig) -> TestProxy {
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.observability.metrics_enabled = false;

    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = ProxyServer::new(config);
    let cache = server.cache();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    TestProxy {
        addr,
        cache,
        _shutdown: shutdown,
    }
}

/// Write `request` to the proxy and collect everything it sends back until
/// the connection closes. A reset counts as closed.
pub async fn send_request(proxy: SocketAddr, request: &str) -> Vec<u8> {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    read_until_closed(&mut stream).await
}

pub async fn read_until_closed(stream: &mut TcpStream) -> Vec<u8> {
    let mut received = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => received.extend_from_slice(&chunk[..n]),
        }
    }
    received
}

/// Build a syntactically valid HTTP response of exactly `total` bytes,
/// headers included.
pub fn response_of_size(total: usize) -> Vec<u8> {
    let head = b"HTTP/1.0 200 OK\r\nContent-Type: text/html\r\n\r\n";
    assert!(total > head.len(), "response too small for its own headers");
    let mut response = head.to_vec();
    response.resize(total, b'a');
    response
}
