//! In-memory WebSocket pairs for transport tests.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{DuplexStream, duplex};
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::Role;

const PIPE_CAPACITY: usize = 64 * 1024;
const FRAME_WAIT: Duration = Duration::from_secs(2);

/// Returns a connected `(client, server)` pair over an in-memory pipe.
pub(crate) async fn ws_pair() -> (WebSocketStream<DuplexStream>, WebSocketStream<DuplexStream>) {
    let (client, server) = duplex(PIPE_CAPACITY);
    let client = WebSocketStream::from_raw_socket(client, Role::Client, None).await;
    let server = WebSocketStream::from_raw_socket(server, Role::Server, None).await;
    (client, server)
}

/// Server side of a test connection.
pub(crate) struct Peer {
    ws: WebSocketStream<DuplexStream>,
}

impl Peer {
    pub(crate) fn new(ws: WebSocketStream<DuplexStream>) -> Self {
        Self { ws }
    }

    /// Sends one text frame to the client.
    pub(crate) async fn push(&mut self, frame: &str) {
        self.ws
            .send(WsMessage::Text(frame.to_owned().into()))
            .await
            .expect("push frame");
    }

    /// Returns the next text frame from the client.
    pub(crate) async fn next_frame(&mut self) -> Option<String> {
        self.next_frame_within(FRAME_WAIT).await
    }

    /// Returns the next text frame, or `None` if none arrives within `wait`.
    pub(crate) async fn next_frame_within(&mut self, wait: Duration) -> Option<String> {
        timeout(wait, async {
            while let Some(Ok(frame)) = self.ws.next().await {
                match frame {
                    WsMessage::Text(text) => return Some(text.to_string()),
                    WsMessage::Close(_) => return None,
                    _ => continue,
                }
            }
            None
        })
        .await
        .ok()
        .flatten()
    }
}
