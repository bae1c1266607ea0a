//! Injectable wall-clock time source.
//!
//! The handshake URL carries a unix timestamp cache-buster. Reading it
//! through [`Clock`] keeps URL construction deterministic under test.
//! Deadlines inside the read loop use tokio's clock instead, which tests
//! pause and advance directly.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

// ============================================================================
// Clock
// ============================================================================

/// Source of wall-clock time.
pub trait Clock: fmt::Debug + Send + Sync {
    /// Returns the current time.
    fn now(&self) -> SystemTime;

    /// Returns whole seconds since the unix epoch.
    ///
    /// Times before the epoch read as zero.
    fn unix_seconds(&self) -> u64 {
        self.now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

// ============================================================================
// SystemClock
// ============================================================================

/// [`Clock`] backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

// ============================================================================
// FixedClock
// ============================================================================

/// [`Clock`] frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(SystemTime);

impl FixedClock {
    /// Creates a clock stuck at `time`.
    #[inline]
    #[must_use]
    pub const fn new(time: SystemTime) -> Self {
        Self(time)
    }

    /// Creates a clock stuck at `secs` seconds after the unix epoch.
    #[inline]
    #[must_use]
    pub fn from_unix_seconds(secs: u64) -> Self {
        Self(UNIX_EPOCH + Duration::from_secs(secs))
    }
}

impl Clock for FixedClock {
    #[inline]
    fn now(&self) -> SystemTime {
        self.0
    }
}

// ============================================================================
// Tests
// ============================================================================
