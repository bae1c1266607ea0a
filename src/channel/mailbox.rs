//! Per-endpoint mailbox.
//!
//! A [`Channel`] is the dispatcher's side of an endpoint; the matching
//! [`ChannelStream`] is what callers read payloads from.
//!
//! The mailbox is a handoff point, not a buffer: [`Channel::receive`]
//! returns only once a reader has taken the payload.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, trace};

use crate::error::Result;
use crate::identifiers::Endpoint;
use crate::protocol::Message;
use crate::transport::Sender;

// ============================================================================
// Constants
// ============================================================================

/// Slot for the payload in flight; [`Channel::receive`] waits until it drains.
const MAILBOX_CAPACITY: usize = 1;

// ============================================================================
// Channel
// ============================================================================

/// Registered endpoint: mailbox writer plus the caller-facing stream.
#[derive(Clone)]
pub(crate) struct Channel {
    endpoint: Endpoint,
    mailbox: mpsc::Sender<String>,
    output: ChannelStream,
}

impl Channel {
    /// Announces `endpoint` to the peer and creates its mailbox.
    ///
    /// # Errors
    ///
    /// Whatever sending the connect frame fails with; no mailbox is created.
    pub(crate) async fn open(endpoint: Endpoint, sender: &Sender) -> Result<Self> {
        sender.send_message(&Message::connect(&endpoint)).await?;

        let (mailbox, rx) = mpsc::channel(MAILBOX_CAPACITY);
        debug!(endpoint = %endpoint, "Channel opened");

        Ok(Self {
            output: ChannelStream::new(endpoint.clone(), rx),
            endpoint,
            mailbox,
        })
    }

    /// Delivers one payload and waits until a reader has taken it.
    pub(crate) async fn receive(&self, payload: String) {
        trace!(endpoint = %self.endpoint, "Delivering payload");

        // The stream half lives in `self.output`, so the receiver outlives us
        if self.mailbox.send(payload).await.is_err() {
            debug!(endpoint = %self.endpoint, "Mailbox closed, payload dropped");
            return;
        }

        // The slot frees only when the reader takes the payload
        if let Ok(permit) = self.mailbox.reserve().await {
            drop(permit);
        }
    }

    /// Returns a handle to the caller-facing stream.
    #[inline]
    pub(crate) fn output(&self) -> ChannelStream {
        self.output.clone()
    }
}

// ============================================================================
// ChannelStream
// ============================================================================

/// Payloads for one endpoint, in arrival order.
///
/// Handles are cheap to clone and share one mailbox: each payload goes to
/// exactly one reader.
///
/// A payload that is not read holds up every endpoint on the connection,
/// heartbeats included. Keep reading, or drop the [`Session`](crate::Session).
#[derive(Clone)]
pub struct ChannelStream {
    endpoint: Endpoint,
    rx: Arc<Mutex<mpsc::Receiver<String>>>,
}

impl ChannelStream {
    fn new(endpoint: Endpoint, rx: mpsc::Receiver<String>) -> Self {
        Self {
            endpoint,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Receives the next payload.
    ///
    /// Returns `None` once the connection is gone.
    pub async fn recv(&self) -> Option<String> {
        self.rx.lock().await.recv().await
    }

    /// Returns the endpoint this stream reads from.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Converts into a boxed [`Stream`](futures_util::Stream) of payloads.
    pub fn into_stream(self) -> BoxStream<'static, String> {
        stream::unfold(self, |channel| async move {
            let payload = channel.recv().await?;
            Some((payload, channel))
        })
        .boxed()
    }
}

impl fmt::Debug for ChannelStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelStream")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
