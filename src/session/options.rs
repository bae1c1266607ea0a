//! Session tunables.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::transport::DEFAULT_READ_LIMIT;

// ============================================================================
// Constants
// ============================================================================

/// Protocol version spoken by default.
pub const DEFAULT_PROTOCOL_VERSION: u32 = 1;

/// Default limit for the handshake request.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// SessionOptions
// ============================================================================

/// Tunables applied to a session and its connection.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Protocol version in the handshake and upgrade URLs.
    pub protocol_version: u32,

    /// Largest inbound frame accepted, in bytes.
    pub read_limit: usize,

    /// Limit for the whole handshake request.
    pub handshake_timeout: Duration,

    /// Time source for the handshake timestamp.
    pub clock: Arc<dyn Clock>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            read_limit: DEFAULT_READ_LIMIT,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            clock: Arc::new(SystemClock),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
