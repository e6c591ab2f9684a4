//! Error taxonomy for transports, stream attempts and listener dispatch.

use thiserror::Error;

/// Error a listener returns to signal that it failed.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by a streaming transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, reset, bad TLS, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The request could not be built from the supplied configuration.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Request timed out before the response head arrived.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The operation observed its cancellation signal.
    #[error("Request cancelled")]
    Cancelled,
}

impl TransportError {
    /// Returns `true` if this error was caused by cancellation rather than
    /// an I/O failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors surfaced by the stream client.
///
/// Transport-level variants are delivered through the `"error"` event and
/// never returned from [`Client::connect`](crate::Client::connect).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status or the response had no
    /// readable body.
    #[error("SSE connection failed: {reason}")]
    ConnectionFailed {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    /// Reading the body failed after the stream was opened.
    #[error("SSE stream read failed: {0}")]
    StreamReadFailure(#[source] TransportError),

    /// The attempt was stopped by an explicit `close()`.
    #[error("SSE attempt cancelled")]
    Cancelled,

    /// A listener returned an error; remaining listeners for that emit were
    /// not invoked.
    #[error("listener for '{event_type}' failed: {source}")]
    HandlerFailure {
        event_type: String,
        #[source]
        source: ListenerError,
    },
}

impl ClientError {
    /// Returns `true` for the silent, user-initiated shutdown outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if this error should schedule a reconnection.
    pub fn is_retryable(&self) -> bool {
        !self.is_cancelled()
    }

    /// HTTP status for `ConnectionFailed`, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ConnectionFailed { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Cancelled => Self::Cancelled,
            other => Self::StreamReadFailure(other),
        }
    }
}
