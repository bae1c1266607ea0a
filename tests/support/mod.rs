//! In-process socket.io peer for integration tests.
//!
//! One TCP listener answers both halves of a session: plain HTTP requests
//! get the handshake body, upgrade requests get a WebSocket that greets
//! with a connect frame.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::handshake::derive_accept_key;
use tokio_tungstenite::tungstenite::protocol::Role;

const FRAME_WAIT: Duration = Duration::from_secs(2);

/// How the peer answers upgrade requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upgrade {
    Accept,
    Reject,
}

/// Mock server bound to a random local port.
pub struct MockPeer {
    addr: SocketAddr,
    upgrades: Arc<AtomicUsize>,
    push: mpsc::UnboundedSender<String>,
    received: Mutex<mpsc::UnboundedReceiver<String>>,
    task: JoinHandle<()>,
}

impl MockPeer {
    /// Starts a peer answering handshakes with `handshake_body`.
    pub async fn start(handshake_body: &str, upgrade: Upgrade) -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let upgrades = Arc::new(AtomicUsize::new(0));
        let (push, push_rx) = mpsc::unbounded_channel();
        let (received_tx, received) = mpsc::unbounded_channel();

        let task = tokio::spawn(serve(
            listener,
            handshake_body.to_owned(),
            upgrade,
            Arc::clone(&upgrades),
            Arc::new(Mutex::new(Some(push_rx))),
            received_tx,
        ));

        Ok(Self {
            addr,
            upgrades,
            push,
            received: Mutex::new(received),
            task,
        })
    }

    /// Host string for the session builder.
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    /// Number of WebSocket upgrade requests seen.
    pub fn upgrades(&self) -> usize {
        self.upgrades.load(Ordering::SeqCst)
    }

    /// Sends a frame to the connected client.
    pub fn push(&self, frame: &str) {
        let _ = self.push.send(frame.to_owned());
    }

    /// Next frame written by the client.
    pub async fn next_frame(&self) -> Option<String> {
        self.next_frame_within(FRAME_WAIT).await
    }

    /// Next frame written by the client, or `None` after `wait`.
    pub async fn next_frame_within(&self, wait: Duration) -> Option<String> {
        let mut received = self.received.lock().await;
        timeout(wait, received.recv()).await.ok().flatten()
    }
}

impl Drop for MockPeer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Installs a test subscriber honoring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn serve(
    listener: TcpListener,
    handshake_body: String,
    upgrade: Upgrade,
    upgrades: Arc<AtomicUsize>,
    push_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<String>>>>,
    received: mpsc::UnboundedSender<String>,
) {
    while let Ok((stream, _)) = listener.accept().await {
        let handshake_body = handshake_body.clone();
        let upgrades = Arc::clone(&upgrades);
        let push_rx = Arc::clone(&push_rx);
        let received = received.clone();

        tokio::spawn(async move {
            let _ = handle(stream, &handshake_body, upgrade, &upgrades, &push_rx, received).await;
        });
    }
}

async fn handle(
    mut stream: TcpStream,
    handshake_body: &str,
    upgrade: Upgrade,
    upgrades: &AtomicUsize,
    push_rx: &Mutex<Option<mpsc::UnboundedReceiver<String>>>,
    received: mpsc::UnboundedSender<String>,
) -> anyhow::Result<()> {
    let head = read_head(&mut stream).await?;
    let lower = head.to_ascii_lowercase();

    if !lower.contains("upgrade: websocket") {
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            handshake_body.len(),
            handshake_body
        );
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await?;
        return Ok(());
    }

    upgrades.fetch_add(1, Ordering::SeqCst);

    if upgrade == Upgrade::Reject {
        let body = "handshake unauthorized";
        let response = format!(
            "HTTP/1.1 401 Unauthorized\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await?;
        return Ok(());
    }

    let key = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("sec-websocket-key")
                .then(|| value.trim().to_owned())
        })
        .ok_or_else(|| anyhow::anyhow!("missing Sec-WebSocket-Key"))?;

    let response = format!(
        "HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Accept: {}\r\n\r\n",
        derive_accept_key(key.as_bytes())
    );
    stream.write_all(response.as_bytes()).await?;

    let ws = WebSocketStream::from_raw_socket(stream, Role::Server, None).await;
    let (mut sink, mut source) = ws.split();
    sink.send(WsMessage::Text("1::".into())).await?;

    let mut push_rx = push_rx.lock().await.take();

    loop {
        tokio::select! {
            Some(frame) = async { push_rx.as_mut()?.recv().await } => {
                sink.send(WsMessage::Text(frame.into())).await?;
            }
            frame = source.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    let _ = received.send(text.to_string());
                }
                Some(Ok(_)) => continue,
                _ => break,
            },
        }
    }

    Ok(())
}

async fn read_head(stream: &mut TcpStream) -> anyhow::Result<String> {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];

    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            anyhow::bail!("connection closed before request head");
        }
        head.extend_from_slice(&chunk[..n]);
    }

    Ok(String::from_utf8_lossy(&head).into_owned())
}
