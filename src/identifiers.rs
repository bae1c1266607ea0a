//! Type-safe identifiers for protocol entities.
//!
//! Newtype wrappers prevent mixing a handshake socket ID with an endpoint
//! name at compile time.

// ============================================================================
// Imports
// ============================================================================

use std::borrow::Borrow;
use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// Separator every endpoint name starts with.
const ENDPOINT_SEPARATOR: char = '/';

// ============================================================================
// SocketId
// ============================================================================

/// Session identifier issued by the server during the handshake.
///
/// Opaque to the client; only echoed back in the upgrade URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SocketId(String);

impl SocketId {
    /// Wraps a raw socket ID.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw socket ID.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Endpoint
// ============================================================================

/// Name of a logical channel multiplexed over one connection.
///
/// Always carries exactly one leading `/`, whatever the caller passed in:
///
/// ```
/// use kivaio::Endpoint;
///
/// assert_eq!(Endpoint::new("loan.posted").as_str(), "/loan.posted");
/// assert_eq!(Endpoint::new("/loan.posted").as_str(), "/loan.posted");
/// assert_eq!(Endpoint::new("//loan.posted").as_str(), "/loan.posted");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint(String);

impl Endpoint {
    /// Normalizes `name` into an endpoint.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        let bare = name.as_ref().trim_start_matches(ENDPOINT_SEPARATOR);
        Self(format!("{ENDPOINT_SEPARATOR}{bare}"))
    }

    /// Returns the normalized endpoint string.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Endpoint {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Endpoint {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Endpoint {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

// ============================================================================
// Tests
// ============================================================================
