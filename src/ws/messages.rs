//! WebSocket message types sent to clients.

use serde::{Deserialize, Serialize};

use crate::domain::Record;

/// Discriminator for server → client messages.
///
/// The protocol has a single message type; the tag is kept so clients can
/// dispatch on it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Full record list for one request's window.
    Bulk,
}

/// Server → client envelope, sent once per successfully handled request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Message type discriminator, always `"bulk"`.
    #[serde(rename = "type")]
    pub msg_type: ResponseType,
    /// Aggregated records.
    pub data: Vec<Record>,
}

impl ResponseEnvelope {
    /// Wraps records in a bulk envelope.
    #[must_use]
    pub const fn bulk(data: Vec<Record>) -> Self {
        Self {
            msg_type: ResponseType::Bulk,
            data,
        }
    }
}
