//! ssefetch-http: `reqwest` transport for the ssefetch client.
//!
//! # Features
//! - Any HTTP method, headers and body from [`ClientConfig`]
//! - Long-lived response bodies (connect timeout only, no overall timeout)
//! - Cooperative cancellation of the request and of body reads
//! - `query` / `timeoutMs` passthrough options

pub mod transport;

use std::sync::Arc;

use ssefetch_core::{Client, ClientConfig, TransportError};

pub use transport::{HttpStreamTransport, HttpTransportConfig};

/// Build a [`Client`] for `url` that streams over a default
/// [`HttpStreamTransport`].
pub fn client(url: impl Into<String>, config: ClientConfig) -> Result<Client, TransportError> {
    let transport = HttpStreamTransport::new(HttpTransportConfig::default())?;
    Ok(Client::new(url, config, Arc::new(transport)))
}
