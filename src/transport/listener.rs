//! Read loop and close-timeout watchdog.
//!
//! The listener owns the read half of the transport. It decodes every
//! frame, publishes it to the dispatcher, and fires the ready signal on the
//! first connection-level connect or disconnect.
//!
//! # Watchdog
//!
//! Every decoded frame other than a disconnect re-arms a deadline of
//! `now + close_timeout`. If no frame arrives before the deadline the
//! transport is considered dead: the loop stops, the write half is closed
//! and the connection becomes [`ReadyState::Closed`](super::ReadyState::Closed).
//!
//! Frames longer than the read limit and decode failures are logged and
//! skipped; they do not re-arm the watchdog.
//!
//! # Handoff
//!
//! Publishing a frame waits until the dispatcher has taken it. Frames that
//! arrive before the ready signal are dropped, since the dispatcher is not
//! consuming yet.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::result::Result as StdResult;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout_at};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{Category, Message};

use super::state::StateCell;
use super::{FrameStream, Sender};

// ============================================================================
// Constants
// ============================================================================

/// Slot for the frame in flight; publishing waits until it drains.
const STREAM_CAPACITY: usize = 1;

// ============================================================================
// Types
// ============================================================================

/// Decoded frames in wire order.
pub(crate) type MessageStream = mpsc::Receiver<Message>;

/// Fires once: `true` when the peer connects, `false` if it disconnects first.
pub(crate) type ReadySignal = oneshot::Receiver<bool>;

// ============================================================================
// Watchdog
// ============================================================================

/// Close-timeout deadline on the read path.
#[derive(Debug)]
pub(crate) struct Watchdog {
    close_timeout: Duration,
    deadline: Instant,
}

impl Watchdog {
    /// Creates a watchdog armed at `now + close_timeout`.
    pub(crate) fn new(close_timeout: Duration) -> Self {
        Self {
            close_timeout,
            deadline: Instant::now() + close_timeout,
        }
    }

    /// Re-arms for any frame except a disconnect. Returns whether it re-armed.
    pub(crate) fn observe(&mut self, message: &Message) -> bool {
        if message.category == Category::Disconnect {
            return false;
        }
        self.deadline = Instant::now() + self.close_timeout;
        true
    }

    /// Runs `future` until the deadline.
    ///
    /// # Errors
    ///
    /// [`Error::CloseTimeout`] if the deadline passes first.
    pub(crate) async fn guard<F: Future>(&self, future: F) -> Result<F::Output> {
        timeout_at(self.deadline, future)
            .await
            .map_err(|_| Error::close_timeout(self.close_timeout.as_millis() as u64))
    }
}

// ============================================================================
// Listener
// ============================================================================

/// Owner of the transport's read half.
pub(crate) struct Listener {
    stream: FrameStream,
    sender: Sender,
    state: Arc<StateCell>,
    close_timeout: Duration,
    read_limit: usize,
}

impl Listener {
    /// Creates a listener over `stream`.
    ///
    /// `sender` is closed when the read loop ends. Frames longer than
    /// `read_limit` bytes are skipped.
    pub(crate) fn new(
        stream: FrameStream,
        sender: Sender,
        state: Arc<StateCell>,
        close_timeout: Duration,
        read_limit: usize,
    ) -> Self {
        Self {
            stream,
            sender,
            state,
            close_timeout,
            read_limit,
        }
    }

    /// Arms the watchdog and spawns the read loop.
    pub(crate) fn listen(self) -> (MessageStream, ReadySignal, JoinHandle<()>) {
        let (messages_tx, messages_rx) = mpsc::channel(STREAM_CAPACITY);
        let (ready_tx, ready_rx) = oneshot::channel();
        let watchdog = Watchdog::new(self.close_timeout);

        let task = tokio::spawn(self.run(watchdog, messages_tx, ready_tx));

        (messages_rx, ready_rx, task)
    }

    /// The read loop.
    async fn run(
        self,
        mut watchdog: Watchdog,
        messages: mpsc::Sender<Message>,
        ready: oneshot::Sender<bool>,
    ) {
        let Self {
            mut stream,
            sender,
            state,
            read_limit,
            ..
        } = self;
        let mut messages = Some(messages);
        let mut ready = Some(ready);

        loop {
            let frame = match watchdog.guard(stream.next()).await {
                Err(e) => {
                    warn!(error = %e, "Watchdog expired");
                    break;
                }
                Ok(None) => {
                    debug!("WebSocket stream ended");
                    break;
                }
                Ok(Some(Err(e))) => {
                    error!(error = %e, "WebSocket error");
                    break;
                }
                Ok(Some(Ok(frame))) => frame,
            };

            if matches!(frame, WsMessage::Text(_) | WsMessage::Binary(_))
                && frame.len() > read_limit
            {
                warn!(len = frame.len(), read_limit, "Skipping oversized frame");
                continue;
            }

            let decoded = match frame {
                WsMessage::Text(text) => Message::decode(&text),
                WsMessage::Binary(bytes) => match std::str::from_utf8(&bytes) {
                    Ok(text) => Message::decode(text),
                    Err(e) => {
                        warn!(error = %e, "Skipping non-UTF-8 binary frame");
                        continue;
                    }
                },
                WsMessage::Close(_) => {
                    debug!("WebSocket closed by remote");
                    break;
                }
                // Ping, Pong and raw frames carry no protocol data
                _ => continue,
            };

            let message = match decoded {
                Ok(message) => message,
                Err(e) => {
                    warn!(error = %e, "Skipping malformed frame");
                    continue;
                }
            };

            trace!(frame = %message, "Frame received");

            watchdog.observe(&message);

            if message.is_connection_level() {
                match message.category {
                    Category::Connect => {
                        state.mark_ready();
                        signal(&mut ready, true);
                    }
                    Category::Disconnect => {
                        state.mark_closed();
                        signal(&mut ready, false);
                    }
                    _ => {}
                }
            }

            if ready.is_some() {
                trace!("Connection not ready, frame dropped");
                continue;
            }

            if let Some(tx) = &messages
                && publish(tx, message).await.is_err()
            {
                debug!("Dispatcher not running, dropping further frames");
                messages = None;
            }
        }

        state.mark_closed();
        sender.close().await;

        debug!("Read loop terminated");
    }
}

/// Fires the ready signal if it has not fired yet.
fn signal(ready: &mut Option<oneshot::Sender<bool>>, value: bool) {
    if let Some(tx) = ready.take() {
        let _ = tx.send(value);
    }
}

/// Hands `message` to the dispatcher and waits until it has been taken.
async fn publish(
    tx: &mpsc::Sender<Message>,
    message: Message,
) -> StdResult<(), mpsc::error::SendError<Message>> {
    tx.send(message).await?;
    // The slot frees only when the dispatcher takes the frame
    if let Ok(permit) = tx.reserve().await {
        drop(permit);
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
