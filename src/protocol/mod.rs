//! Wire protocol frame types.
//!
//! This module defines the text frame format exchanged with the server
//! after the WebSocket upgrade.
//!
//! # Protocol Overview
//!
//! | Category | Direction | Purpose |
//! |----------|-----------|---------|
//! | `Connect` | both | Connection ready / endpoint announcement |
//! | `Disconnect` | Remote → Local | Connection or endpoint teardown |
//! | `Heartbeat` | both | Liveness; echoed back immediately |
//! | `Data` | Remote → Local | Payload routed to an endpoint |
//! | `Json`, `Event`, `Ack`, `Error`, `Noop` | Remote → Local | Logged, not routed |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `category` | Frame category enum |
//! | `message` | Decoded frame and text codec |

// ============================================================================
// Submodules
// ============================================================================

/// Frame category enum.
pub mod category;

/// Decoded frame and text codec.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use category::Category;
pub use message::{EventPayload, Message};
