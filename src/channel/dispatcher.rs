//! Frame routing and channel registry.
//!
//! The dispatcher consumes decoded frames once the peer has confirmed the
//! connection and handles each by category:
//!
//! | Category | Action |
//! |----------|--------|
//! | `Heartbeat` | Echo a heartbeat |
//! | `Data` | Deliver the payload to the endpoint's mailbox |
//! | `Connect`, `Disconnect` | Log |
//! | `Event`, `Error` | Log with detail |
//! | other | Log and drop |
//!
//! Delivery blocks until the channel's reader takes the payload. The
//! registry lock is released before delivery, so channels can be opened
//! meanwhile.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::error::Result;
use crate::identifiers::Endpoint;
use crate::protocol::{Category, Message};
use crate::transport::Sender;
use crate::transport::listener::{MessageStream, ReadySignal};

use super::mailbox::{Channel, ChannelStream};

// ============================================================================
// Dispatcher
// ============================================================================

/// Routes frames to channels and owns the channel registry.
#[derive(Clone)]
pub(crate) struct Dispatcher {
    sender: Sender,
    channels: Arc<Mutex<FxHashMap<Endpoint, Channel>>>,
    /// Serializes announce-then-register.
    registration: Arc<AsyncMutex<()>>,
}

impl Dispatcher {
    /// Creates a dispatcher writing through `sender`.
    pub(crate) fn new(sender: Sender) -> Self {
        Self {
            sender,
            channels: Arc::new(Mutex::new(FxHashMap::default())),
            registration: Arc::new(AsyncMutex::new(())),
        }
    }

    /// Spawns the dispatch loop.
    ///
    /// The loop waits for the ready signal. If the peer disconnects first,
    /// or the read loop ends without signalling, no frame is ever routed.
    pub(crate) fn handle(&self, messages: MessageStream, ready: ReadySignal) -> JoinHandle<()> {
        let dispatcher = self.clone();

        tokio::spawn(async move {
            match ready.await {
                Ok(true) => {
                    info!("Connection ready");
                    dispatcher.run(messages).await;
                }
                Ok(false) => warn!("Peer disconnected before connection was ready"),
                Err(_) => debug!("Read loop ended before connection was ready"),
            }
        })
    }

    async fn run(&self, mut messages: MessageStream) {
        while let Some(message) = messages.recv().await {
            self.dispatch(message).await;
        }

        debug!("Dispatch loop terminated");
    }

    async fn dispatch(&self, message: Message) {
        match message.category {
            Category::Connect => debug!(endpoint = %message.endpoint, "Connect frame"),

            Category::Disconnect => info!(endpoint = %message.endpoint, "Disconnect frame"),

            Category::Heartbeat => {
                trace!("Heartbeat");
                if let Err(e) = self.sender.send_message(&Message::heartbeat()).await {
                    warn!(error = %e, "Failed to echo heartbeat");
                }
            }

            Category::Data => self.route(message).await,

            Category::Event => match message.event() {
                Ok(event) => debug!(
                    endpoint = %message.endpoint,
                    name = %event.name,
                    "Event frame dropped"
                ),
                Err(e) => debug!(error = %e, "Undecodable event frame dropped"),
            },

            Category::Error => warn!(
                endpoint = %message.endpoint,
                reason = %message.data,
                "Error frame from peer"
            ),

            other => debug!(category = %other, endpoint = %message.endpoint, "Frame dropped"),
        }
    }

    async fn route(&self, message: Message) {
        let channel = self.channels.lock().get(message.endpoint.as_str()).cloned();

        match channel {
            Some(channel) => channel.receive(message.data).await,
            None => debug!(endpoint = %message.endpoint, "No channel for endpoint, payload dropped"),
        }
    }
}

// ============================================================================
// Dispatcher - Registry
// ============================================================================

impl Dispatcher {
    /// Returns the stream for `endpoint`, announcing it on first use.
    ///
    /// # Errors
    ///
    /// Whatever sending the connect frame fails with. The endpoint is not
    /// registered in that case, so a later call announces again.
    pub(crate) async fn open_channel(&self, endpoint: Endpoint) -> Result<ChannelStream> {
        let _registration = self.registration.lock().await;

        if let Some(channel) = self.channels.lock().get(&endpoint) {
            return Ok(channel.output());
        }

        let channel = Channel::open(endpoint.clone(), &self.sender).await?;
        let output = channel.output();
        self.channels.lock().insert(endpoint, channel);

        Ok(output)
    }

    /// Returns the number of registered channels.
    #[inline]
    pub(crate) fn channel_count(&self) -> usize {
        self.channels.lock().len()
    }
}

// ============================================================================
// Tests
// ============================================================================
