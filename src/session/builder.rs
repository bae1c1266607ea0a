//! Builder pattern for session configuration.
//!
//! Provides a fluent API for configuring and creating [`Session`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use kivaio::Session;
//!
//! # async fn example() -> kivaio::Result<()> {
//! let session = Session::builder()
//!     .host("streams.kiva.org")
//!     .handshake_timeout(Duration::from_secs(10))
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::error::{Error, Result};

use super::core::Session;
use super::options::SessionOptions;

// ============================================================================
// SessionBuilder
// ============================================================================

/// Builder for configuring a [`Session`].
///
/// Use [`Session::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct SessionBuilder {
    /// Server host, optionally with port.
    host: Option<String>,
    /// Tunables.
    options: SessionOptions,
}

// ============================================================================
// SessionBuilder Implementation
// ============================================================================

impl SessionBuilder {
    /// Creates a builder with default options and no host.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server host.
    ///
    /// # Arguments
    ///
    /// * `host` - Host name, optionally with port (e.g. "streams.kiva.org")
    #[inline]
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the protocol version.
    #[inline]
    #[must_use]
    pub fn protocol_version(mut self, version: u32) -> Self {
        self.options.protocol_version = version;
        self
    }

    /// Sets the largest inbound frame accepted, in bytes.
    #[inline]
    #[must_use]
    pub fn read_limit(mut self, bytes: usize) -> Self {
        self.options.read_limit = bytes;
        self
    }

    /// Sets the limit for the handshake request.
    #[inline]
    #[must_use]
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.options.handshake_timeout = timeout;
        self
    }

    /// Sets the time source for the handshake timestamp.
    #[inline]
    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.options.clock = Arc::new(clock);
        self
    }

    /// Validates the configuration and performs the handshake.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the host is missing or invalid, or the read
    ///   limit is zero
    /// - [`Error::HandshakeFailed`] if the handshake fails
    /// - [`Error::UnsupportedTransport`] if the server does not accept WebSocket
    pub async fn build(self) -> Result<Session> {
        let host = self.validate_host()?;
        self.validate_options()?;

        Session::handshake(host, self.options).await
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SessionBuilder {
    /// Validates the host.
    fn validate_host(&self) -> Result<String> {
        let host = self.host.as_deref().map(str::trim).unwrap_or_default();

        if host.is_empty() {
            return Err(Error::config(
                "Host is required. Use .host() to set it.\n\
                 Example: Session::builder().host(\"streams.kiva.org\")",
            ));
        }

        if host.contains("://") || host.contains('/') {
            return Err(Error::config(format!(
                "Host must be a bare host name with optional port, got {host:?}"
            )));
        }

        Ok(host.to_owned())
    }

    /// Validates the tunables.
    fn validate_options(&self) -> Result<()> {
        if self.options.read_limit == 0 {
            return Err(Error::config("Read limit must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
