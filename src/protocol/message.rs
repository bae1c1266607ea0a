//! Decoded protocol frames and the text codec.
//!
//! # Format
//!
//! ```text
//! category ":" [id ["+"]] ":" [endpoint] [":" data]
//! ```
//!
//! Only `category` is mandatory. Every later field may be empty, and
//! trailing empty fields may be dropped together with their separators.
//! `data` is the remainder of the frame and may itself contain `:`.
//!
//! | Frame | Meaning |
//! |-------|---------|
//! | `1::` | connection established |
//! | `1::/loan.posted` | endpoint `/loan.posted` established |
//! | `2::` | heartbeat |
//! | `3::/loan.posted:{"id":1}` | payload for `/loan.posted` |
//! | `5:7+::{"name":"ping"}` | event with id 7, ack requested |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::Endpoint;

use super::Category;

// ============================================================================
// Constants
// ============================================================================

/// Separates the frame fields.
const FIELD_SEPARATOR: char = ':';

/// Suffix on the id field requesting an acknowledgement carrying data.
const ACK_MARKER: char = '+';

// ============================================================================
// Message
// ============================================================================

/// A decoded protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Frame category; drives dispatch.
    pub category: Category,
    /// Acknowledgement correlation id; empty when absent.
    pub id: String,
    /// Whether the id carried the `+` marker.
    pub ack: bool,
    /// Target endpoint; empty for connection-level frames.
    pub endpoint: String,
    /// Payload body; may be empty.
    pub data: String,
}

// ============================================================================
// Message - Constructors
// ============================================================================

impl Message {
    /// Creates a frame with only category and endpoint set.
    #[inline]
    #[must_use]
    pub fn new(category: Category, endpoint: impl Into<String>) -> Self {
        Self {
            category,
            id: String::new(),
            ack: false,
            endpoint: endpoint.into(),
            data: String::new(),
        }
    }

    /// Creates the connect frame announcing `endpoint` to the peer.
    #[inline]
    #[must_use]
    pub fn connect(endpoint: &Endpoint) -> Self {
        Self::new(Category::Connect, endpoint.as_str())
    }

    /// Creates a connection-level heartbeat frame.
    #[inline]
    #[must_use]
    pub fn heartbeat() -> Self {
        Self::new(Category::Heartbeat, "")
    }

    /// Creates a disconnect frame; empty `endpoint` closes the connection.
    #[inline]
    #[must_use]
    pub fn disconnect(endpoint: impl Into<String>) -> Self {
        Self::new(Category::Disconnect, endpoint)
    }

    /// Creates a data frame carrying `data` to `endpoint`.
    #[inline]
    #[must_use]
    pub fn data(endpoint: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Self::new(Category::Data, endpoint)
        }
    }
}

// ============================================================================
// Message - Codec
// ============================================================================

impl Message {
    /// Decodes one raw text frame.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedFrame`] if the category is missing or not a
    /// non-negative integer, or if the id field is not numeric.
    pub fn decode(raw: &str) -> Result<Self> {
        let mut fields = raw.splitn(4, FIELD_SEPARATOR);

        let category = parse_category(raw, fields.next().unwrap_or_default())?;
        let (id, ack) = parse_id(raw, fields.next().unwrap_or_default())?;
        let endpoint = fields.next().unwrap_or_default().to_owned();
        let data = fields.next().unwrap_or_default().to_owned();

        Ok(Self {
            category,
            id,
            ack,
            endpoint,
            data,
        })
    }

    /// Encodes the frame into its wire form.
    ///
    /// The data separator is only written when there is data, so a
    /// heartbeat encodes as `2::` and an endpoint announcement as
    /// `1::/endpoint`.
    #[must_use]
    pub fn encode(&self) -> String {
        let ack = if self.ack { "+" } else { "" };
        let mut frame = format!(
            "{}{FIELD_SEPARATOR}{}{ack}{FIELD_SEPARATOR}{}",
            self.category.code(),
            self.id,
            self.endpoint
        );
        if !self.data.is_empty() {
            frame.push(FIELD_SEPARATOR);
            frame.push_str(&self.data);
        }
        frame
    }
}

fn parse_category(raw: &str, field: &str) -> Result<Category> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::malformed_frame(
            raw,
            format!("category {field:?} is not a non-negative integer"),
        ));
    }

    field
        .parse::<u32>()
        .map(Category::from_code)
        .map_err(|e| Error::malformed_frame(raw, format!("category {field:?}: {e}")))
}

fn parse_id(raw: &str, field: &str) -> Result<(String, bool)> {
    let (id, ack) = match field.strip_suffix(ACK_MARKER) {
        Some(id) => (id, true),
        None => (field, false),
    };

    if !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::malformed_frame(
            raw,
            format!("id {field:?} is not numeric"),
        ));
    }

    Ok((id.to_owned(), ack))
}

// ============================================================================
// Message - Accessors
// ============================================================================

impl Message {
    /// Returns `true` if the frame addresses the connection, not an endpoint.
    #[inline]
    #[must_use]
    pub fn is_connection_level(&self) -> bool {
        self.endpoint.is_empty()
    }

    /// Deserializes the payload as JSON.
    ///
    /// # Errors
    ///
    /// [`Error::Json`] if the payload is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.data)?)
    }

    /// Parses the payload of an event frame.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedFrame`] if this is not an event frame
    /// - [`Error::Json`] if the payload is not an event object
    pub fn event(&self) -> Result<EventPayload> {
        if self.category != Category::Event {
            return Err(Error::malformed_frame(
                self.encode(),
                format!("expected event frame, got {}", self.category),
            ));
        }
        self.json()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

// ============================================================================
// EventPayload
// ============================================================================

/// Body of an event frame.
///
/// # Format
///
/// ```json
/// { "name": "eventName", "args": [ ... ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Event name.
    pub name: String,

    /// Event arguments.
    #[serde(default)]
    pub args: Vec<Value>,
}

// ============================================================================
// Tests
// ============================================================================
