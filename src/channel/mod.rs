//! Endpoint channels.
//!
//! Every endpoint opened on a connection gets one mailbox holding a single
//! payload. The dispatcher routes `Data` frames into mailboxes by endpoint;
//! callers read them through [`ChannelStream`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `dispatcher` | Frame routing and channel registry |
//! | `mailbox` | Per-endpoint mailbox and caller stream |

// ============================================================================
// Submodules
// ============================================================================

/// Frame routing and channel registry.
pub(crate) mod dispatcher;

/// Per-endpoint mailbox and caller stream.
pub mod mailbox;

// ============================================================================
// Re-exports
// ============================================================================

pub use mailbox::ChannelStream;

pub(crate) use dispatcher::Dispatcher;
