//! Shared utilities for relay integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use radio_relay::{HttpServer, RelayConfig, Shutdown};

/// One action of a scripted upstream response.
#[derive(Debug, Clone)]
pub enum Step {
    /// Send one chunk of body bytes.
    Chunk(&'static [u8]),
    /// Wait before the next step.
    Delay(Duration),
    /// Terminate the chunked body cleanly and close.
    Finish,
    /// Close the socket without terminating the body.
    Abort,
    /// Keep the connection open and send nothing.
    Stall,
    /// Send `chunk` every `interval` until the peer goes away.
    Endless {
        chunk: &'static [u8],
        interval: Duration,
    },
}

/// A scripted upstream response.
#[derive(Debug, Clone)]
pub enum Script {
    /// `200 OK`, `audio/mpeg`, chunked body driven by steps.
    Stream(Vec<Step>),
    /// A complete non-streaming response with the given status line.
    Status(&'static str),
}

/// Handle to a running mock icecast server.
pub struct MockUpstream {
    pub addr: SocketAddr,
    /// Raw request heads, in arrival order.
    pub requests: mpsc::UnboundedReceiver<String>,
    /// Connection indices whose peer closed during an endless stream.
    pub closed: mpsc::UnboundedReceiver<usize>,
    pub connections: Arc<AtomicUsize>,
}

impl MockUpstream {
    pub fn url(&self) -> String {
        format!("http://{}/live", self.addr)
    }
}

/// Start a mock upstream. `script` is called with each connection's index.
pub async fn start_stream_backend<F>(script: F) -> MockUpstream
where
    F: Fn(usize) -> Script + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (request_tx, requests) = mpsc::unbounded_channel();
    let (closed_tx, closed) = mpsc::unbounded_channel();
    let connections = Arc::new(AtomicUsize::new(0));
    let script = Arc::new(script);

    let counter = connections.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let index = counter.fetch_add(1, Ordering::SeqCst);
            let script = script(index);
            let request_tx = request_tx.clone();
            let closed_tx = closed_tx.clone();

            tokio::spawn(async move {
                let head = read_request_head(&mut socket).await;
                let _ = request_tx.send(head);
                if play(&mut socket, script).await {
                    let _ = closed_tx.send(index);
                }
            });
        }
    });

    MockUpstream {
        addr,
        requests,
        closed,
        connections,
    }
}

async fn read_request_head(socket: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&head).into_owned()
}

/// Returns true when the peer closed an endless stream.
async fn play(socket: &mut TcpStream, script: Script) -> bool {
    let steps = match script {
        Script::Status(status) => {
            let body = status.split_once(' ').map(|(_, reason)| reason).unwrap_or("");
            let response = format!(
                "HTTP/1.1 {}\r\n\
                 Content-Type: text/plain\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
            return false;
        }
        Script::Stream(steps) => steps,
    };

    let head = "HTTP/1.1 200 OK\r\n\
                Content-Type: audio/mpeg\r\n\
                icy-name: Test FM\r\n\
                icy-br: 128\r\n\
                Set-Cookie: upstream=1\r\n\
                Transfer-Encoding: chunked\r\n\r\n";
    if socket.write_all(head.as_bytes()).await.is_err() {
        return false;
    }

    for step in steps {
        match step {
            Step::Chunk(data) => {
                if write_chunk(socket, data).await.is_err() {
                    return false;
                }
            }
            Step::Delay(d) => tokio::time::sleep(d).await,
            Step::Finish => {
                let _ = socket.write_all(b"0\r\n\r\n").await;
                let _ = socket.shutdown().await;
                return false;
            }
            Step::Abort => return false,
            Step::Stall => {
                std::future::pending::<()>().await;
            }
            Step::Endless { chunk, interval } => loop {
                if write_chunk(socket, chunk).await.is_err() {
                    return true;
                }
                tokio::time::sleep(interval).await;
            },
        }
    }
    false
}

async fn write_chunk(socket: &mut TcpStream, data: &[u8]) -> std::io::Result<()> {
    socket
        .write_all(format!("{:x}\r\n", data.len()).as_bytes())
        .await?;
    socket.write_all(data).await?;
    socket.write_all(b"\r\n").await?;
    socket.flush().await
}

/// An address with nothing listening on it.
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Relay configuration pointed at `station_url`.
pub fn relay_config(station_url: &str) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.station.name = "Test FM".into();
    config.station.url = station_url.into();
    config.station.accept_invalid_certs = false;
    config.timeouts.connect_secs = 2;
    config.timeouts.response_secs = 2;
    config
}

/// A relay server running in the background.
pub struct RunningRelay {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<std::io::Result<()>>,
}

impl RunningRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn spawn_relay(config: RelayConfig) -> RunningRelay {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    RunningRelay {
        addr,
        shutdown,
        handle,
    }
}

/// Non-pooled client so dropping a response closes its connection.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Read a body to its end. Returns the bytes and whether it ended in an error.
pub async fn drain(response: &mut reqwest::Response) -> (Vec<u8>, bool) {
    let mut received = Vec::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => received.extend_from_slice(&chunk),
            Ok(None) => return (received, false),
            Err(_) => return (received, true),
        }
    }
}
