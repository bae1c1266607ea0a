//! WebSocket transport layer.
//!
//! This module owns the upgraded socket and the two background tasks bound
//! to it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Connection     │                              │  socket.io 0.9  │
//! │                 │         WebSocket            │  server         │
//! │  Sender  ───────┼─────────────────────────────►│                 │
//! │  Listener ◄─────┼──────────────────────────────┤                 │
//! │  Dispatcher     │  /socket.io/1/websocket/SID  │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Connection::open` - Dial the upgrade URL
//! 2. `Listener::listen` - Start the read loop and the close-timeout watchdog
//! 3. `Dispatcher::handle` - Wait for the ready signal, then route frames
//! 4. `Connection::open_channel` - Announce endpoints, receive payloads
//! 5. Watchdog expiry or peer close - Read loop ends, write half closes
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Connection composition and upgrade |
//! | `listener` | Read loop and watchdog |
//! | `sender` | Serialized write path |
//! | `state` | Readiness state |

// ============================================================================
// Imports
// ============================================================================

use std::pin::Pin;

use futures_util::{Sink, Stream};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};

// ============================================================================
// Submodules
// ============================================================================

/// Connection composition and upgrade.
pub mod connection;

/// Read loop and close-timeout watchdog.
pub(crate) mod listener;

/// Serialized write path.
pub(crate) mod sender;

/// Readiness state.
pub(crate) mod state;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Types
// ============================================================================

/// Write half of an upgraded socket.
pub(crate) type FrameSink = Pin<Box<dyn Sink<WsMessage, Error = WsError> + Send>>;

/// Read half of an upgraded socket.
pub(crate) type FrameStream = Pin<Box<dyn Stream<Item = Result<WsMessage, WsError>> + Send>>;

// ============================================================================
// Constants
// ============================================================================

/// Largest inbound frame accepted by default, in bytes.
pub const DEFAULT_READ_LIMIT: usize = 65_536;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, socket_url};
pub use state::ReadyState;

pub(crate) use sender::Sender;
