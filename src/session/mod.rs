//! Session entry point.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Session`] | Handshake result and lazily opened connection |
//! | [`SessionBuilder`] | Fluent configuration builder |
//! | [`SessionOptions`] | Session tunables |
//! | [`Handshake`] | Parameters granted by the server |
//!
//! # Example
//!
//! ```no_run
//! use kivaio::{Result, Session};
//!
//! # async fn example() -> Result<()> {
//! let session = Session::builder()
//!     .host("streams.kiva.org")
//!     .build()
//!     .await?;
//!
//! let loans = session.connect("loan.posted").await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for session configuration.
pub mod builder;

/// Core session implementation.
pub mod core;

/// HTTP handshake.
pub mod handshake;

/// Session tunables.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::SessionBuilder;
pub use self::core::Session;
pub use handshake::{Handshake, handshake_url};
pub use options::SessionOptions;
