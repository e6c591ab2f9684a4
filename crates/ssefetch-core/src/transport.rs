//! The `StreamTransport` trait: the seam between the client and the network.

use std::collections::BTreeMap;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::TransportError;

/// A pinned stream of body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Everything a transport needs to issue one streaming request.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    /// Passthrough options the client does not interpret.
    pub options: Map<String, Value>,
}

impl StreamRequest {
    pub fn from_config(url: impl Into<String>, config: &ClientConfig) -> Self {
        Self {
            url: url.into(),
            method: config.method.clone(),
            headers: config.headers.clone(),
            body: config.body.clone(),
            options: config.options.clone(),
        }
    }
}

/// Response head plus the body reader.
pub struct StreamResponse {
    pub status: u16,
    /// `None` if the response carried no readable body.
    pub body: Option<ByteStream>,
}

impl StreamResponse {
    pub fn new(status: u16, body: ByteStream) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    /// A response with a status and no body.
    pub fn without_body(status: u16) -> Self {
        Self { status, body: None }
    }

    /// `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for StreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamResponse")
            .field("status", &self.status)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Issues streaming requests on behalf of the client.
///
/// Implementations should return [`TransportError::Cancelled`] promptly once
/// `cancel` fires. The client also races every read against the same token,
/// so a transport that ignores it is still stopped between chunks.
#[async_trait]
pub trait StreamTransport: Send + Sync + 'static {
    async fn open(
        &self,
        request: &StreamRequest,
        cancel: CancellationToken,
    ) -> Result<StreamResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_copies_config() {
        let config = ClientConfig::default().with_option("query", serde_json::json!({"a": "b"}));
        let req = StreamRequest::from_config("http://localhost/sse", &config);
        assert_eq!(req.method, "POST");
        assert_eq!(req.body.as_deref(), Some("{}"));
        assert_eq!(req.options["query"]["a"], "b");
    }

    #[test]
    fn success_range() {
        let ok = StreamResponse::without_body(204);
        let redirect = StreamResponse::without_body(302);
        assert!(ok.is_success());
        assert!(!redirect.is_success());
    }
}
