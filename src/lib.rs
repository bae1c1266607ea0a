//! kivaio - socket.io 0.9 streaming client.
//!
//! This library subscribes to named channels on a legacy socket.io server
//! and streams their payloads, such as the Kiva public event stream.
//!
//! # Architecture
//!
//! The client follows a handshake-then-upgrade model:
//!
//! - **Handshake (HTTP)**: Obtains a socket ID and the session timeouts
//! - **Upgrade (WebSocket)**: One connection multiplexes every channel
//!
//! Key design principles:
//!
//! - Each [`Session`] owns at most one [`Connection`], opened lazily
//! - Every channel has a mailbox holding a single payload
//! - Heartbeats are echoed; silence longer than the close timeout drops the transport
//! - Malformed frames are logged and skipped
//!
//! # Quick Start
//!
//! ```no_run
//! use kivaio::{Result, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = Session::new("streams.kiva.org").await?;
//!     let loans = session.connect("loan.posted").await?;
//!
//!     while let Some(payload) = loans.recv().await {
//!         println!("loan.posted: {payload}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`session`] | Handshake and session configuration |
//! | [`channel`] | Endpoint mailboxes and [`ChannelStream`] |
//! | [`transport`] | WebSocket connection, read loop and watchdog |
//! | [`protocol`] | Frame codec |
//! | [`clock`] | Injectable time source |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//!
//! # Backpressure
//!
//! A payload that nobody reads blocks delivery for every channel on the
//! connection, heartbeat echoes included. Consume every channel you open.

// ============================================================================
// Modules
// ============================================================================

/// Endpoint channels and payload streams.
pub mod channel;

/// Injectable time source.
pub mod clock;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
///
/// Newtype wrappers for socket IDs and normalized endpoints.
pub mod identifiers;

/// Wire protocol frame types.
pub mod protocol;

/// Session entry point and handshake.
///
/// Use [`Session::new()`] or [`Session::builder()`] to start.
pub mod session;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Session types
pub use session::{Session, SessionBuilder, SessionOptions};

// Channel types
pub use channel::ChannelStream;

// Transport types
pub use transport::{Connection, ReadyState};

// Protocol types
pub use protocol::{Category, EventPayload, Message};

// Clock types
pub use clock::{Clock, FixedClock, SystemClock};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{Endpoint, SocketId};
