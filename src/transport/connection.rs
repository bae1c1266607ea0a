//! WebSocket connection and background tasks.
//!
//! A [`Connection`] composes the three moving parts bound to one upgraded
//! socket:
//!
//! - the [`Sender`] owning the write half
//! - the [`Listener`] owning the read half and the close-timeout watchdog
//! - the [`Dispatcher`] routing decoded frames to endpoint mailboxes
//!
//! ```text
//! socket ──► Listener ──(1)──► Dispatcher ──(1)──► Channel ──► consumer
//!   ▲                              │
//!   └──────────── Sender ◄─────────┘ heartbeat echo, announcements
//! ```
//!
//! Both arrows marked `(1)` are handoffs: the sender waits until the
//! receiver has taken the item, so a consumer that stops reading stalls the
//! whole connection.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::{WebSocketStream, connect_async_with_config};
use tracing::{debug, info};
use url::Url;

use crate::channel::{ChannelStream, Dispatcher};
use crate::error::{Error, Result};
use crate::identifiers::{Endpoint, SocketId};

use super::listener::Listener;
use super::sender::Sender;
use super::state::{ReadyState, StateCell};

// ============================================================================
// Constants
// ============================================================================

/// Transport name in the upgrade URL.
pub const TRANSPORT: &str = "websocket";

/// Hard ceiling on inbound frames at the socket layer.
///
/// Frames between the read limit and this cap are skipped by the listener;
/// anything larger fails the read and ends the connection.
const FRAME_SIZE_CAP: usize = 16 << 20;

// ============================================================================
// URL
// ============================================================================

/// Builds the WebSocket upgrade URL.
///
/// Format: `ws://{host}/socket.io/{protocol}/websocket/{socket_id}`
///
/// # Errors
///
/// [`Error::Url`] if `host` does not form a valid URL.
pub fn socket_url(host: &str, protocol: u32, socket_id: &SocketId) -> Result<Url> {
    Ok(Url::parse(&format!(
        "ws://{host}/socket.io/{protocol}/{TRANSPORT}/{socket_id}"
    ))?)
}

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a connection.
struct ConnectionInner {
    /// Channel registry and routing.
    dispatcher: Dispatcher,
    /// Readiness, written by the read loop.
    state: Arc<StateCell>,
    /// Read loop task.
    listen_task: JoinHandle<()>,
    /// Dispatch loop task.
    dispatch_task: JoinHandle<()>,
}

impl Drop for ConnectionInner {
    fn drop(&mut self) {
        self.listen_task.abort();
        self.dispatch_task.abort();
    }
}

// ============================================================================
// Connection
// ============================================================================

/// One upgraded socket and its protocol state.
///
/// Cheap to clone; the background tasks stop when the last clone is dropped.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("ready_state", &self.ready_state())
            .field("channel_count", &self.channel_count())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Connection - Constructors
// ============================================================================

impl Connection {
    /// Dials the upgrade URL and starts the connection.
    ///
    /// # Arguments
    ///
    /// * `host` - Server host, optionally with port
    /// * `socket_id` - Socket ID from the handshake
    /// * `protocol` - Protocol version
    /// * `close_timeout` - Silence tolerated before the transport is dropped
    /// * `read_limit` - Largest inbound frame delivered, in bytes; larger
    ///   frames are skipped
    ///
    /// # Errors
    ///
    /// - [`Error::UnauthorizedPeer`] if the upgrade is answered with 401
    /// - [`Error::WebSocket`] for any other transport failure
    pub async fn open(
        host: &str,
        socket_id: &SocketId,
        protocol: u32,
        close_timeout: Duration,
        read_limit: usize,
    ) -> Result<Self> {
        let url = socket_url(host, protocol, socket_id)?;
        let cap = read_limit.max(FRAME_SIZE_CAP);
        let config = WebSocketConfig::default()
            .max_message_size(Some(cap))
            .max_frame_size(Some(cap));

        debug!(%url, read_limit, "Opening WebSocket");

        let (ws_stream, _response) = connect_async_with_config(url.as_str(), Some(config), false)
            .await
            .map_err(upgrade_error)?;

        info!(host, socket_id = %socket_id, "WebSocket connection established");

        Ok(Self::from_stream(ws_stream, close_timeout, read_limit))
    }

    /// Starts a connection over an already-upgraded WebSocket.
    ///
    /// Text and binary frames longer than `read_limit` bytes are skipped.
    /// Must be called from within a tokio runtime.
    pub fn from_stream<S>(
        ws_stream: WebSocketStream<S>,
        close_timeout: Duration,
        read_limit: usize,
    ) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, stream) = ws_stream.split();
        let sender = Sender::new(Box::pin(sink));
        let state = Arc::new(StateCell::default());

        let listener = Listener::new(
            Box::pin(stream),
            sender.clone(),
            Arc::clone(&state),
            close_timeout,
            read_limit,
        );
        let (messages, ready, listen_task) = listener.listen();

        let dispatcher = Dispatcher::new(sender);
        let dispatch_task = dispatcher.handle(messages, ready);

        debug!(close_timeout_ms = close_timeout.as_millis() as u64, "Connection started");

        Self {
            inner: Arc::new(ConnectionInner {
                dispatcher,
                state,
                listen_task,
                dispatch_task,
            }),
        }
    }
}

/// Maps a failed upgrade to the crate error.
fn upgrade_error(err: WsError) -> Error {
    match err {
        WsError::Http(response) if response.status() == StatusCode::UNAUTHORIZED => {
            let body = response
                .body()
                .as_deref()
                .map(String::from_utf8_lossy)
                .unwrap_or_default()
                .into_owned();
            Error::unauthorized_peer(body)
        }
        other => Error::WebSocket(other),
    }
}

// ============================================================================
// Connection - Public API
// ============================================================================

impl Connection {
    /// Opens the channel for `endpoint`, or returns the existing one.
    ///
    /// The first open sends a connect frame for the endpoint; later opens
    /// send nothing and return a handle to the same mailbox.
    ///
    /// # Errors
    ///
    /// Whatever sending the connect frame fails with, see
    /// [`Dispatcher::open_channel`].
    pub async fn open_channel(&self, endpoint: impl Into<Endpoint>) -> Result<ChannelStream> {
        self.inner.dispatcher.open_channel(endpoint.into()).await
    }

    /// Returns the protocol-level state.
    #[inline]
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.inner.state.get()
    }

    /// Returns the number of open channels.
    #[inline]
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.inner.dispatcher.channel_count()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::time::{sleep, timeout};

    use crate::transport::DEFAULT_READ_LIMIT;
    use crate::transport::testing::{Peer, ws_pair};

    const CLOSE_TIMEOUT: Duration = Duration::from_secs(30);
    const QUIET: Duration = Duration::from_millis(200);
    const WAIT: Duration = Duration::from_secs(2);

    async fn connected() -> (Connection, Peer) {
        let (client, server) = ws_pair().await;
        (
            Connection::from_stream(client, CLOSE_TIMEOUT, DEFAULT_READ_LIMIT),
            Peer::new(server),
        )
    }

    async fn wait_for_state(connection: &Connection, expected: ReadyState) {
        timeout(WAIT, async {
            while connection.ready_state() != expected {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("state transition");
    }

    #[test]
    fn test_socket_url() {
        let url = socket_url("fake-hostname", 123, &SocketId::new("fake-socket-id")).unwrap();
        assert_eq!(
            url.as_str(),
            "ws://fake-hostname/socket.io/123/websocket/fake-socket-id"
        );
    }

    #[test]
    fn test_socket_url_with_port() {
        let url = socket_url("127.0.0.1:8080", 1, &SocketId::new("sid")).unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:8080/socket.io/1/websocket/sid");
    }

    #[test]
    fn test_socket_url_rejects_bad_host() {
        assert!(socket_url("bad host", 1, &SocketId::new("sid")).is_err());
    }

    #[tokio::test]
    async fn test_open_channel_announces_once() {
        let (connection, mut peer) = connected().await;
        peer.push("1::").await;

        let first = connection.open_channel("loan.posted").await.unwrap();
        assert_eq!(peer.next_frame().await.as_deref(), Some("1::/loan.posted"));

        let second = connection.open_channel("/loan.posted").await.unwrap();
        assert_eq!(first.endpoint(), second.endpoint());
        assert_eq!(connection.channel_count(), 1);

        // The next frame after the heartbeat echo proves no second announcement
        peer.push("2::").await;
        assert_eq!(peer.next_frame().await.as_deref(), Some("2::"));
    }

    #[tokio::test]
    async fn test_heartbeat_echoed_once() {
        let (connection, mut peer) = connected().await;
        peer.push("1::").await;
        peer.push("2::").await;

        assert_eq!(peer.next_frame().await.as_deref(), Some("2::"));
        assert!(peer.next_frame_within(QUIET).await.is_none());
        assert_eq!(connection.ready_state(), ReadyState::Ready);
    }

    #[tokio::test]
    async fn test_payloads_keep_order() {
        let (connection, mut peer) = connected().await;
        let channel = connection.open_channel("loan.posted").await.unwrap();
        peer.next_frame().await;

        peer.push("1::").await;
        peer.push("3::/loan.posted:first").await;
        peer.push("3::/loan.posted:second").await;

        assert_eq!(channel.recv().await.as_deref(), Some("first"));
        assert_eq!(channel.recv().await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_payloads_routed_by_endpoint() {
        let (connection, mut peer) = connected().await;
        let posted = connection.open_channel("loan.posted").await.unwrap();
        let joined = connection.open_channel("lender.joinedTeam").await.unwrap();
        peer.next_frame().await;
        peer.next_frame().await;

        peer.push("1::").await;
        peer.push("3::/lender.joinedTeam:team").await;
        peer.push("3::/loan.posted:loan").await;

        assert_eq!(joined.recv().await.as_deref(), Some("team"));
        assert_eq!(posted.recv().await.as_deref(), Some("loan"));
    }

    #[tokio::test]
    async fn test_unknown_endpoint_dropped_without_blocking() {
        let (_connection, mut peer) = connected().await;
        peer.push("1::").await;
        peer.push("3::/nobody:lost").await;
        peer.push("3::/nobody:lost again").await;
        peer.push("2::").await;

        assert_eq!(peer.next_frame().await.as_deref(), Some("2::"));
    }

    #[tokio::test]
    async fn test_malformed_frame_does_not_break_routing() {
        let (connection, mut peer) = connected().await;
        let channel = connection.open_channel("loan.posted").await.unwrap();
        peer.next_frame().await;

        peer.push("1::").await;
        peer.push("abc:1::hello").await;
        peer.push("3::/loan.posted:ok").await;

        assert_eq!(channel.recv().await.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_unread_payload_stalls_heartbeat() {
        let (connection, mut peer) = connected().await;
        let channel = connection.open_channel("a").await.unwrap();
        peer.next_frame().await;

        peer.push("1::").await;
        peer.push("3::/a:one").await;
        peer.push("2::").await;

        // A single unread payload is enough to hold the echo back
        assert!(peer.next_frame_within(QUIET).await.is_none());

        assert_eq!(channel.recv().await.as_deref(), Some("one"));
        assert_eq!(peer.next_frame().await.as_deref(), Some("2::"));
    }

    #[tokio::test]
    async fn test_unattended_channel_stalls_dispatch() {
        let (connection, mut peer) = connected().await;
        let stalled = connection.open_channel("a").await.unwrap();
        let other = connection.open_channel("b").await.unwrap();
        peer.next_frame().await;
        peer.next_frame().await;

        peer.push("1::").await;
        peer.push("3::/a:one").await;
        peer.push("3::/b:other").await;
        peer.push("2::").await;

        // The dispatcher waits on "one", so nothing behind it moves
        assert!(peer.next_frame_within(QUIET).await.is_none());
        assert!(timeout(QUIET, other.recv()).await.is_err());

        assert_eq!(stalled.recv().await.as_deref(), Some("one"));
        assert_eq!(other.recv().await.as_deref(), Some("other"));
        assert_eq!(peer.next_frame().await.as_deref(), Some("2::"));
    }

    #[tokio::test]
    async fn test_oversized_frame_skipped_between_payloads() {
        let (client, server) = ws_pair().await;
        let connection = Connection::from_stream(client, CLOSE_TIMEOUT, 64);
        let mut peer = Peer::new(server);
        let channel = connection.open_channel("a").await.unwrap();
        peer.next_frame().await;

        peer.push("1::").await;
        peer.push(&format!("3::/a:{}", "x".repeat(500))).await;
        peer.push("3::/a:ok").await;

        assert_eq!(channel.recv().await.as_deref(), Some("ok"));
        assert_eq!(connection.ready_state(), ReadyState::Ready);
    }

    #[tokio::test]
    async fn test_no_dispatch_after_early_disconnect() {
        let (connection, mut peer) = connected().await;
        peer.push("0::").await;
        wait_for_state(&connection, ReadyState::Closed).await;

        let channel = connection.open_channel("loan.posted").await.unwrap();
        assert_eq!(peer.next_frame().await.as_deref(), Some("1::/loan.posted"));

        peer.push("3::/loan.posted:never").await;
        peer.push("2::").await;

        assert!(timeout(QUIET, channel.recv()).await.is_err());
        assert!(peer.next_frame_within(QUIET).await.is_none());
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let (connection, mut peer) = connected().await;
        assert_eq!(connection.ready_state(), ReadyState::Pending);

        peer.push("1::").await;
        wait_for_state(&connection, ReadyState::Ready).await;

        drop(peer);
        wait_for_state(&connection, ReadyState::Closed).await;
    }

    #[tokio::test]
    async fn test_open_channel_fails_after_transport_dies() {
        let (connection, peer) = connected().await;
        drop(peer);
        wait_for_state(&connection, ReadyState::Closed).await;

        // Closed state is set before the write half is shut
        let err = timeout(WAIT, async {
            loop {
                match connection.open_channel("late").await {
                    Err(e) => return e,
                    Ok(_) => sleep(Duration::from_millis(5)).await,
                }
            }
        })
        .await
        .expect("open_channel should start failing");

        assert!(err.is_connection_error());
        assert_eq!(connection.channel_count(), 0);
    }
}
