//! HTTP handshake.
//!
//! Before the upgrade the client asks the server for a socket ID and the
//! session timeouts. The answer is a single line:
//!
//! ```text
//! {socket_id}:{heartbeat_timeout}:{close_timeout}:{transport},{transport},...
//! ```
//!
//! Timeouts are whole seconds; an empty timeout field means zero.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::identifiers::SocketId;
use crate::transport::connection::TRANSPORT;

// ============================================================================
// URL
// ============================================================================

/// Builds the handshake URL, stamped with the clock's Unix time.
///
/// Format: `http://{host}/socket.io/{protocol}?t={unix_seconds}`
///
/// # Errors
///
/// [`Error::Url`] if `host` does not form a valid URL.
pub fn handshake_url(host: &str, protocol: u32, clock: &dyn Clock) -> Result<Url> {
    let mut url = Url::parse(&format!("http://{host}/socket.io/{protocol}"))?;
    url.query_pairs_mut()
        .append_pair("t", &clock.unix_seconds().to_string());
    Ok(url)
}

// ============================================================================
// Handshake
// ============================================================================

/// Session parameters granted by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    /// Socket ID for the upgrade URL.
    pub socket_id: SocketId,
    /// Expected heartbeat cadence.
    pub heartbeat_timeout: Duration,
    /// Silence tolerated before the transport is dropped.
    pub close_timeout: Duration,
    /// Transports the server accepts.
    pub transports: Vec<String>,
}

impl Handshake {
    /// Parses a handshake response body.
    ///
    /// # Errors
    ///
    /// [`Error::HandshakeFailed`] if the body has fewer than four fields,
    /// an empty socket ID, or a non-numeric timeout.
    pub fn parse(body: &str) -> Result<Self> {
        let mut fields = body.trim().splitn(4, ':');

        let (Some(socket_id), Some(heartbeat), Some(close), Some(transports)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(Error::handshake_failed(format!(
                "expected 'sid:heartbeat:close:transports', got {body:?}"
            )));
        };

        if socket_id.is_empty() {
            return Err(Error::handshake_failed("empty socket ID"));
        }

        Ok(Self {
            socket_id: SocketId::new(socket_id),
            heartbeat_timeout: parse_seconds("heartbeat timeout", heartbeat)?,
            close_timeout: parse_seconds("close timeout", close)?,
            transports: transports
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
        })
    }

    /// Returns `true` if the server accepts `transport`.
    #[inline]
    #[must_use]
    pub fn supports(&self, transport: &str) -> bool {
        self.transports.iter().any(|t| t == transport)
    }

    /// Fails unless the server accepts WebSocket.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedTransport`] listing what the server offered.
    pub fn require_websocket(&self) -> Result<()> {
        if self.supports(TRANSPORT) {
            Ok(())
        } else {
            Err(Error::unsupported_transport(TRANSPORT, &self.transports))
        }
    }
}

fn parse_seconds(field: &str, value: &str) -> Result<Duration> {
    if value.is_empty() {
        return Ok(Duration::ZERO);
    }

    value
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| Error::handshake_failed(format!("invalid {field}: {value:?}")))
}

// ============================================================================
// Fetch
// ============================================================================

/// Requests the handshake and parses the answer.
///
/// # Errors
///
/// [`Error::HandshakeFailed`] if the request fails, the status is not a
/// success, or the body is not a handshake line.
pub async fn fetch(client: &reqwest::Client, url: Url) -> Result<Handshake> {
    debug!(%url, "Requesting handshake");

    let response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| Error::handshake_failed(e.to_string()))?;

    let body = response
        .text()
        .await
        .map_err(|e| Error::handshake_failed(e.to_string()))?;

    debug!(body = %body.trim(), "Handshake response");

    Handshake::parse(&body)
}

// ============================================================================
// Tests
// ============================================================================
