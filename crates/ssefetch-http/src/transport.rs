//! Streaming HTTP transport backed by `reqwest`.
//!
//! Recognised passthrough options:
//! - `query`: object of key/value pairs appended to the URL
//! - `timeoutMs`: limit on how long to wait for the response head
//!
//! Other options are ignored (logged at debug level).

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use ssefetch_core::error::TransportError;
use ssefetch_core::transport::{StreamRequest, StreamResponse, StreamTransport};

const KNOWN_OPTIONS: &[&str] = &["query", "timeoutMs"];

/// Configuration for [`HttpStreamTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// TCP/TLS connect timeout. The body itself is never timed out.
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            user_agent: concat!("ssefetch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// [`StreamTransport`] that issues requests with a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpStreamTransport {
    http: reqwest::Client,
}

impl HttpStreamTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            // No overall timeout: the response body is long-lived.
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| TransportError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    fn build(&self, request: &StreamRequest) -> Result<reqwest::RequestBuilder, TransportError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| TransportError::InvalidRequest(format!("bad method: {}", request.method)))?;

        let mut builder = self.http.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(query) = request.options.get("query") {
            builder = builder.query(&query_pairs(query)?);
        }
        for key in request.options.keys() {
            if !KNOWN_OPTIONS.contains(&key.as_str()) {
                tracing::debug!(option = %key, "ignoring unsupported transport option");
            }
        }
        Ok(builder)
    }
}

/// Flatten a JSON object into query pairs; non-string scalars are rendered
/// as JSON text.
fn query_pairs(query: &Value) -> Result<Vec<(String, String)>, TransportError> {
    let Value::Object(map) = query else {
        return Err(TransportError::InvalidRequest(
            "`query` option must be an object".into(),
        ));
    };
    Ok(map
        .iter()
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), v)
        })
        .collect())
}

fn head_timeout(request: &StreamRequest) -> Option<Duration> {
    request
        .options
        .get("timeoutMs")
        .and_then(Value::as_u64)
        .map(Duration::from_millis)
}

#[async_trait]
impl StreamTransport for HttpStreamTransport {
    async fn open(
        &self,
        request: &StreamRequest,
        cancel: CancellationToken,
    ) -> Result<StreamResponse, TransportError> {
        let builder = self.build(request)?;
        tracing::debug!(url = %request.url, method = %request.method, "sending stream request");

        let limit = head_timeout(request);
        let send = async move {
            match limit {
                Some(limit) => tokio::time::timeout(limit, builder.send())
                    .await
                    .map_err(|_| TransportError::Timeout {
                        ms: limit.as_millis() as u64,
                    }),
                None => Ok(builder.send().await),
            }
        };

        let resp = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            resp = send => resp?.map_err(|e| TransportError::Http(e.to_string()))?,
        };

        let status = resp.status().as_u16();
        tracing::debug!(url = %request.url, status, "stream response received");

        let body = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Http(e.to_string())))
            .take_until(cancel.cancelled_owned());
        Ok(StreamResponse::new(status, Box::pin(body)))
    }
}
