//! Frame categories.
//!
//! The first field of every frame is an integer selecting one of nine
//! categories. Codes outside that range are kept as
//! [`Category::Unrecognized`] so newer peers do not break decoding.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// Category
// ============================================================================

/// Category of a protocol frame.
///
/// | Code | Variant |
/// |------|---------|
/// | 0 | [`Category::Disconnect`] |
/// | 1 | [`Category::Connect`] |
/// | 2 | [`Category::Heartbeat`] |
/// | 3 | [`Category::Data`] |
/// | 4 | [`Category::Json`] |
/// | 5 | [`Category::Event`] |
/// | 6 | [`Category::Ack`] |
/// | 7 | [`Category::Error`] |
/// | 8 | [`Category::Noop`] |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Connection or endpoint teardown.
    Disconnect,
    /// Connection or endpoint established.
    Connect,
    /// Liveness check; must be echoed.
    Heartbeat,
    /// Plain text payload (`MESSAGE` on the wire).
    Data,
    /// JSON-encoded payload.
    Json,
    /// Named event with JSON arguments.
    Event,
    /// Acknowledgement of a previous frame.
    Ack,
    /// Error reported by the peer.
    Error,
    /// No operation.
    Noop,
    /// Numeric category this client does not know.
    Unrecognized(u32),
}

impl Category {
    /// Maps a wire code to a category.
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Disconnect,
            1 => Self::Connect,
            2 => Self::Heartbeat,
            3 => Self::Data,
            4 => Self::Json,
            5 => Self::Event,
            6 => Self::Ack,
            7 => Self::Error,
            8 => Self::Noop,
            other => Self::Unrecognized(other),
        }
    }

    /// Returns the wire code.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Disconnect => 0,
            Self::Connect => 1,
            Self::Heartbeat => 2,
            Self::Data => 3,
            Self::Json => 4,
            Self::Event => 5,
            Self::Ack => 6,
            Self::Error => 7,
            Self::Noop => 8,
            Self::Unrecognized(code) => code,
        }
    }

    /// Returns `true` for the nine categories defined by the protocol.
    #[inline]
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnect => "disconnect",
            Self::Connect => "connect",
            Self::Heartbeat => "heartbeat",
            Self::Data => "message",
            Self::Json => "json",
            Self::Event => "event",
            Self::Ack => "ack",
            Self::Error => "error",
            Self::Noop => "noop",
            Self::Unrecognized(code) => return write!(f, "unrecognized({code})"),
        };
        f.write_str(name)
    }
}

// ============================================================================
// Tests
// ============================================================================
