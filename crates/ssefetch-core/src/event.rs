//! Event types delivered to listeners.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Event type names emitted by the client.
pub mod kind {
    pub const OPEN: &str = "open";
    pub const MESSAGE: &str = "message";
    pub const ERROR: &str = "error";
    pub const CLOSE: &str = "close";
}

/// One dispatched unit of streamed data, derived from one line of text.
///
/// Without field parsing the whole line is both the `data` and the `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: String,
    pub id: String,
    /// Retry interval in milliseconds the client is configured with.
    pub retry: u64,
}

impl EventRecord {
    /// Build a `"message"` record from one line.
    pub fn from_line(line: impl Into<String>, retry_ms: u64) -> Self {
        let data = line.into();
        Self {
            event_type: kind::MESSAGE.to_string(),
            id: data.clone(),
            data,
            retry: retry_ms,
        }
    }
}

/// Payload handed to listeners.
#[derive(Debug, Clone)]
pub enum Event {
    /// The response was validated and streaming has started.
    Open,
    /// A non-empty line arrived.
    Message(EventRecord),
    /// A connection or stream failure.
    Error(Arc<ClientError>),
    /// An attempt that had opened has ended.
    Close,
    /// Caller-defined payload passed to [`Client::emit`](crate::Client::emit).
    Custom(serde_json::Value),
}

impl Event {
    /// The event type the client dispatches this payload under.
    ///
    /// A `Custom` payload has no type of its own and reports `"custom"`;
    /// [`Client::emit`](crate::Client::emit) delivers it under whatever type
    /// the caller passes.
    pub fn event_type(&self) -> &str {
        match self {
            Self::Open => kind::OPEN,
            Self::Message(record) => &record.event_type,
            Self::Error(_) => kind::ERROR,
            Self::Close => kind::CLOSE,
            Self::Custom(_) => "custom",
        }
    }

    pub fn as_message(&self) -> Option<&EventRecord> {
        match self {
            Self::Message(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ClientError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }
}
