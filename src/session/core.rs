//! Session implementation.
//!
//! A [`Session`] is one client identity toward one host. It performs the
//! handshake once, opens the WebSocket connection lazily on the first
//! [`Session::connect`], and reuses it for every later channel.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::channel::ChannelStream;
use crate::error::{Error, Result};
use crate::identifiers::{Endpoint, SocketId};
use crate::transport::{Connection, ReadyState};

use super::builder::SessionBuilder;
use super::handshake::{self, Handshake};
use super::options::SessionOptions;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a session.
struct SessionInner {
    /// Server host, optionally with port.
    host: String,
    /// Parameters granted by the handshake.
    handshake: Handshake,
    /// Tunables.
    options: SessionOptions,
    /// Opened on first connect.
    connection: OnceCell<Connection>,
}

// ============================================================================
// Session
// ============================================================================

/// Client session toward one host.
///
/// Cheap to clone; clones share the handshake and the connection.
///
/// # Example
///
/// ```no_run
/// use kivaio::Session;
///
/// # async fn example() -> kivaio::Result<()> {
/// let session = Session::new("streams.kiva.org").await?;
/// let loans = session.connect("loan.posted").await?;
///
/// while let Some(payload) = loans.recv().await {
///     println!("{payload}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.inner.host)
            .field("socket_id", self.socket_id())
            .field("ready_state", &self.ready_state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Session - Constructors
// ============================================================================

impl Session {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Performs the handshake with default options.
    ///
    /// # Errors
    ///
    /// See [`SessionBuilder::build`].
    pub async fn new(host: impl Into<String>) -> Result<Self> {
        Self::builder().host(host).build().await
    }

    /// Runs the handshake for a validated configuration.
    pub(crate) async fn handshake(host: String, options: SessionOptions) -> Result<Self> {
        let url = handshake::handshake_url(&host, options.protocol_version, options.clock.as_ref())?;

        let client = reqwest::Client::builder()
            .timeout(options.handshake_timeout)
            .build()
            .map_err(|e| Error::handshake_failed(e.to_string()))?;

        let handshake = handshake::fetch(&client, url).await?;
        handshake.require_websocket()?;

        info!(
            host = %host,
            socket_id = %handshake.socket_id,
            heartbeat_timeout_s = handshake.heartbeat_timeout.as_secs(),
            close_timeout_s = handshake.close_timeout.as_secs(),
            "Handshake complete"
        );

        Ok(Self {
            inner: Arc::new(SessionInner {
                host,
                handshake,
                options,
                connection: OnceCell::new(),
            }),
        })
    }
}

// ============================================================================
// Session - Public API
// ============================================================================

impl Session {
    /// Opens the channel `name` and returns its payload stream.
    ///
    /// `name` may be given with or without its leading `/`. The first call
    /// opens the WebSocket connection; a failed open is not remembered, so
    /// the next call tries again.
    ///
    /// # Errors
    ///
    /// - [`Error::UnauthorizedPeer`] if the upgrade is rejected
    /// - [`Error::WebSocket`] if the connection cannot be opened
    /// - [`Error::ConnectionClosed`] or [`Error::SendFailed`] if the
    ///   endpoint cannot be announced
    pub async fn connect(&self, name: &str) -> Result<ChannelStream> {
        let endpoint = Endpoint::new(name);
        let connection = self.connection().await?;

        debug!(endpoint = %endpoint, "Connecting channel");

        connection.open_channel(endpoint).await
    }

    /// Returns the connection state, or `None` before the first connect.
    #[must_use]
    pub fn ready_state(&self) -> Option<ReadyState> {
        self.inner.connection.get().map(Connection::ready_state)
    }

    /// Returns the socket ID granted by the handshake.
    #[inline]
    #[must_use]
    pub fn socket_id(&self) -> &SocketId {
        &self.inner.handshake.socket_id
    }

    /// Returns the heartbeat timeout granted by the handshake.
    #[inline]
    #[must_use]
    pub fn heartbeat_timeout(&self) -> Duration {
        self.inner.handshake.heartbeat_timeout
    }

    /// Returns the close timeout granted by the handshake.
    #[inline]
    #[must_use]
    pub fn close_timeout(&self) -> Duration {
        self.inner.handshake.close_timeout
    }

    /// Returns the transports the server accepts.
    #[inline]
    #[must_use]
    pub fn transports(&self) -> &[String] {
        &self.inner.handshake.transports
    }

    /// Returns the server host.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.inner.host
    }

    /// Returns the protocol version.
    #[inline]
    #[must_use]
    pub fn protocol(&self) -> u32 {
        self.inner.options.protocol_version
    }
}

// ============================================================================
// Session - Internal
// ============================================================================

impl Session {
    /// Returns the connection, opening it on first use.
    async fn connection(&self) -> Result<&Connection> {
        let inner = &self.inner;

        inner
            .connection
            .get_or_try_init(|| {
                Connection::open(
                    &inner.host,
                    &inner.handshake.socket_id,
                    inner.options.protocol_version,
                    inner.handshake.close_timeout,
                    inner.options.read_limit,
                )
            })
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
