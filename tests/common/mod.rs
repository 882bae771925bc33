//! Shared utilities for gateway integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use imwallet_proxy::Config;

/// Shared secret used by every test gateway.
pub const TEST_SECRET: &str = "it-test-secret";

/// One request as the mock upstream saw it on the wire.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Raw path + query from the request line
    pub target: String,
    pub content_type: Option<String>,
    pub user_agent: Option<String>,
    pub body: String,
}

/// Shared view of everything a mock upstream has served.
#[derive(Clone, Default)]
pub struct UpstreamLog {
    hits: Arc<AtomicU32>,
    disconnects: Arc<AtomicU32>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl UpstreamLog {
    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }

    /// Connections the caller closed before the mock answered.
    pub fn disconnects(&self) -> u32 {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests()
            .pop()
            .expect("mock upstream saw no requests")
    }

    fn record(&self, request: RecordedRequest) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
    }

    fn note_disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Start a mock upstream answering every request with a fixed response.
///
/// Binds an ephemeral port so concurrent tests cannot collide; the
/// returned address goes into `Config::upstream_base`. A `None` content
/// type omits the header entirely.
pub async fn start_mock_upstream(
    status: u16,
    content_type: Option<&'static str>,
    body: &'static str,
) -> (SocketAddr, UpstreamLog) {
    start_upstream_with_delay(status, content_type, body, Duration::ZERO).await
}

/// Same as [`start_mock_upstream`] but waits before answering, for
/// driving the gateway into its outbound timeout.
pub async fn start_upstream_with_delay(
    status: u16,
    content_type: Option<&'static str>,
    body: &'static str,
    delay: Duration,
) -> (SocketAddr, UpstreamLog) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log = UpstreamLog::default();

    let accept_log = log.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let log = accept_log.clone();
                    tokio::spawn(async move {
                        if let Some(request) = read_request(&mut socket).await {
                            log.record(request);
                        }
                        if !delay.is_zero() {
                            // A caller giving up during the delay closes its
                            // end; count that instead of answering
                            let mut scratch = [0u8; 32];
                            tokio::select! {
                                _ = tokio::time::sleep(delay) => {}
                                read = socket.read(&mut scratch) => {
                                    if matches!(read, Ok(0) | Err(_)) {
                                        log.note_disconnect();
                                        return;
                                    }
                                }
                            }
                        }
                        let content_type_line = content_type
                            .map(|ct| format!("Content-Type: {}\r\n", ct))
                            .unwrap_or_default();
                        let response = format!(
                            "HTTP/1.1 {}\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text(status),
                            content_type_line,
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

    (addr, log)
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        201 => "201 Created",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    }
}

/// Read one HTTP/1.1 request (head plus Content-Length body) off the socket.
async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let mut content_type = None;
    let mut user_agent = None;
    let mut content_length = 0usize;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim().to_string();
            match name.to_ascii_lowercase().as_str() {
                "content-type" => content_type = Some(value),
                "user-agent" => user_agent = Some(value),
                "content-length" => content_length = value.parse().unwrap_or(0),
                _ => {}
            }
        }
    }

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(RecordedRequest {
        method,
        target,
        content_type,
        user_agent,
        body: String::from_utf8_lossy(&body).to_string(),
    })
}

/// Address where nothing is listening, for connect-failure tests.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Config pointing at a mock upstream, keep-alive off.
pub fn gateway_config(port: u16, upstream: SocketAddr) -> Config {
    let mut config = Config::default();
    config.port = port;
    config.secret = TEST_SECRET.to_string();
    config.upstream_base = format!("http://{}", upstream);
    config.keep_alive = false;
    config
}

/// Spawn the gateway and wait for it to accept connections.
///
/// Returns the shutdown sender; dropping it also stops the server.
pub async fn start_gateway(config: Config) -> tokio::sync::oneshot::Sender<()> {
    let (tx, rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let _ = imwallet_proxy::start_proxy(Arc::new(config), rx).await;
    });
    tokio::time::sleep(Duration::from_millis(400)).await;
    tx
}

/// Client that never picks up ambient proxy configuration.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
