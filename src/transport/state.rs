//! Connection readiness state.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicU8, Ordering};

// ============================================================================
// ReadyState
// ============================================================================

/// Protocol-level state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReadyState {
    /// Transport is up; the peer has not confirmed the connection yet.
    Pending = 0,
    /// The peer sent a connection-level connect frame.
    Ready = 1,
    /// The peer disconnected or the transport died.
    Closed = 2,
}

impl ReadyState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Pending,
            1 => Self::Ready,
            _ => Self::Closed,
        }
    }
}

// ============================================================================
// StateCell
// ============================================================================

/// Atomically shared [`ReadyState`].
///
/// Written by the read loop, read from any task.
#[derive(Debug, Default)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    /// Returns the current state.
    #[inline]
    pub(crate) fn get(&self) -> ReadyState {
        ReadyState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves `Pending` to `Ready`. Returns `false` if already past pending.
    pub(crate) fn mark_ready(&self) -> bool {
        self.0
            .compare_exchange(
                ReadyState::Pending as u8,
                ReadyState::Ready as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Moves to `Closed` from any state.
    #[inline]
    pub(crate) fn mark_closed(&self) {
        self.0.store(ReadyState::Closed as u8, Ordering::Release);
    }
}

// ============================================================================
// Tests
// ============================================================================
