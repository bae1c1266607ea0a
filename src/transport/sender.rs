//! Serialized write path to the transport.
//!
//! Heartbeat echoes come from the dispatch task while endpoint
//! announcements come from callers, so every write goes through one async
//! mutex and one frame is written per call.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::SinkExt;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::Message;

use super::FrameSink;

// ============================================================================
// WriteHalf
// ============================================================================

/// Lifecycle of the transport's write half.
enum WriteHalf {
    /// Never attached to a transport.
    ///
    /// Senders built by a connection start `Open`, so outside tests a send
    /// never fails with [`Error::TransportNotReady`].
    #[cfg_attr(not(test), allow(dead_code))]
    Detached,
    /// Attached and writable.
    Open(FrameSink),
    /// Shut down after the read loop ended.
    Closed,
}

// ============================================================================
// Sender
// ============================================================================

/// Cloneable handle writing text frames to the transport.
#[derive(Clone)]
pub(crate) struct Sender {
    half: Arc<Mutex<WriteHalf>>,
}

impl Sender {
    /// Creates a sender writing to `sink`.
    pub(crate) fn new(sink: FrameSink) -> Self {
        Self {
            half: Arc::new(Mutex::new(WriteHalf::Open(sink))),
        }
    }

    /// Writes one raw frame.
    ///
    /// # Errors
    ///
    /// - [`Error::TransportNotReady`] if no transport is attached
    /// - [`Error::ConnectionClosed`] if the transport was shut down
    /// - [`Error::SendFailed`] if the write fails
    pub(crate) async fn send(&self, frame: String) -> Result<()> {
        let mut half = self.half.lock().await;

        let sink = match &mut *half {
            WriteHalf::Open(sink) => sink,
            WriteHalf::Detached => return Err(Error::TransportNotReady),
            WriteHalf::Closed => return Err(Error::ConnectionClosed),
        };

        trace!(frame = %frame, "Sending frame");

        sink.send(WsMessage::Text(frame.into()))
            .await
            .map_err(|e| Error::send_failed(e.to_string()))
    }

    /// Encodes and writes `message`.
    #[inline]
    pub(crate) async fn send_message(&self, message: &Message) -> Result<()> {
        self.send(message.encode()).await
    }

    /// Closes the write half. Later sends fail with [`Error::ConnectionClosed`].
    pub(crate) async fn close(&self) {
        let mut half = self.half.lock().await;

        if let WriteHalf::Open(mut sink) = std::mem::replace(&mut *half, WriteHalf::Closed)
            && let Err(e) = sink.close().await
        {
            debug!(error = %e, "Failed to close write half");
        }
    }
}

#[cfg(test)]
impl Sender {
    /// Creates a sender with no transport behind it.
    pub(crate) fn detached() -> Self {
        Self {
            half: Arc::new(Mutex::new(WriteHalf::Detached)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
