//! Error types for the kivaio client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use kivaio::{Result, Session};
//!
//! async fn example() -> Result<()> {
//!     let session = Session::new("streams.kiva.org").await?;
//!     let loans = session.connect("loan.posted").await?;
//!     while let Some(payload) = loans.recv().await {
//!         println!("{payload}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Handshake | [`Error::HandshakeFailed`], [`Error::UnsupportedTransport`] |
//! | Connection | [`Error::UnauthorizedPeer`], [`Error::ConnectionClosed`], [`Error::CloseTimeout`] |
//! | Frames | [`Error::MalformedFrame`], [`Error::TransportNotReady`], [`Error::SendFailed`] |
//! | External | [`Error::Json`], [`Error::WebSocket`], [`Error::Url`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;
use url::ParseError as UrlError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when session configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Handshake Errors
    // ========================================================================
    /// The handshake request failed.
    ///
    /// Returned when the handshake endpoint is unreachable, answers with a
    /// non-success status, or returns a body that is not a handshake line.
    #[error("Handshake failed: {message}")]
    HandshakeFailed {
        /// Description of the handshake failure.
        message: String,
    },

    /// The server does not offer the transport this client speaks.
    #[error("Transport '{transport}' not supported by server (available: {available})")]
    UnsupportedTransport {
        /// The transport the client requires.
        transport: String,
        /// Comma-separated transports advertised by the server.
        available: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// The peer rejected the WebSocket upgrade with `401 Unauthorized`.
    #[error("Upgrade rejected by peer: {body}")]
    UnauthorizedPeer {
        /// Response body returned with the rejection.
        body: String,
    },

    /// The transport was shut down.
    ///
    /// Returned when writing after the read loop has terminated.
    #[error("Connection closed")]
    ConnectionClosed,

    /// No frame arrived within the close timeout.
    #[error("No frame received within close timeout of {timeout_ms}ms")]
    CloseTimeout {
        /// Close timeout in milliseconds.
        timeout_ms: u64,
    },

    // ========================================================================
    // Frame Errors
    // ========================================================================
    /// A raw frame could not be decoded.
    #[error("Malformed frame {frame:?}: {reason}")]
    MalformedFrame {
        /// The offending raw frame.
        frame: String,
        /// Why decoding failed.
        reason: String,
    },

    /// Send attempted on a sender that has no transport attached.
    ///
    /// Connections attach their sender on creation, so sends made through a
    /// [`Session`](crate::Session) report [`Error::ConnectionClosed`] instead.
    #[error("Transport not ready")]
    TransportNotReady,

    /// Writing a frame to the transport failed.
    #[error("Send failed: {message}")]
    SendFailed {
        /// Description of the write failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// URL parse error.
    #[error("Invalid URL: {0}")]
    Url(#[from] UrlError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a handshake failed error.
    #[inline]
    pub fn handshake_failed(message: impl Into<String>) -> Self {
        Self::HandshakeFailed {
            message: message.into(),
        }
    }

    /// Creates an unsupported transport error.
    #[inline]
    pub fn unsupported_transport(transport: impl Into<String>, available: &[String]) -> Self {
        Self::UnsupportedTransport {
            transport: transport.into(),
            available: available.join(","),
        }
    }

    /// Creates an unauthorized peer error.
    #[inline]
    pub fn unauthorized_peer(body: impl Into<String>) -> Self {
        Self::UnauthorizedPeer { body: body.into() }
    }

    /// Creates a close timeout error.
    #[inline]
    pub fn close_timeout(timeout_ms: u64) -> Self {
        Self::CloseTimeout { timeout_ms }
    }

    /// Creates a malformed frame error.
    #[inline]
    pub fn malformed_frame(frame: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedFrame {
            frame: frame.into(),
            reason: reason.into(),
        }
    }

    /// Creates a send failed error.
    #[inline]
    pub fn send_failed(message: impl Into<String>) -> Self {
        Self::SendFailed {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::CloseTimeout { .. })
    }

    /// Returns `true` if this is a handshake error.
    #[inline]
    #[must_use]
    pub fn is_handshake_error(&self) -> bool {
        matches!(
            self,
            Self::HandshakeFailed { .. } | Self::UnsupportedTransport { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::UnauthorizedPeer { .. }
                | Self::ConnectionClosed
                | Self::CloseTimeout { .. }
                | Self::TransportNotReady
                | Self::SendFailed { .. }
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors affect a single frame and leave the connection usable.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedFrame { .. } | Self::Json(_))
    }
}

// ============================================================================
// Tests
// ============================================================================
