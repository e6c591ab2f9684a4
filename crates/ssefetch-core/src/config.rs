//! Client configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Configuration for a [`Client`](crate::Client).
///
/// Deserializes from the same camelCase keys the client surface documents
/// (`method`, `headers`, `body`, `retryInterval`). Any other key is kept in
/// [`options`](Self::options) and forwarded to the transport untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// HTTP method. Default: `POST`.
    pub method: String,
    /// Request headers. Supplying this map replaces the defaults entirely.
    pub headers: BTreeMap<String, String>,
    /// Serialized request body. Default: `{}`.
    ///
    /// In JSON config a string is used verbatim; any other value is
    /// serialized.
    #[serde(deserialize_with = "body_from_json")]
    pub body: Option<String>,
    /// Delay between reconnection attempts, in milliseconds. Default: 3000.
    #[serde(rename = "retryInterval")]
    pub retry_interval_ms: u64,
    /// Dispatch an unterminated final line when the stream ends cleanly.
    pub flush_trailing_line: bool,
    /// Transport-level passthrough options.
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

fn body_from_json<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Content-Type".to_string(), "application/json".to_string()),
        ("Accept".to_string(), "text/event-stream".to_string()),
    ])
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            method: "POST".into(),
            headers: default_headers(),
            body: Some(Value::Object(Map::new()).to_string()),
            retry_interval_ms: 3_000,
            flush_trailing_line: false,
            options: Map::new(),
        }
    }
}

impl ClientConfig {
    /// Parse a JSON configuration document, filling unspecified keys with
    /// their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Set one header, keeping the others.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Replace the whole header map.
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Use `body` verbatim as the request body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON request body.
    pub fn with_json_body(mut self, value: &Value) -> Self {
        self.body = Some(value.to_string());
        self
    }

    /// Send no body (e.g. for `GET`).
    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_flush_trailing_line(mut self, flush: bool) -> Self {
        self.flush_trailing_line = flush;
        self
    }

    /// Add a transport passthrough option.
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_surface() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.method, "POST");
        assert_eq!(cfg.headers["Content-Type"], "application/json");
        assert_eq!(cfg.headers["Accept"], "text/event-stream");
        assert_eq!(cfg.body.as_deref(), Some("{}"));
        assert_eq!(cfg.retry_interval(), Duration::from_secs(3));
        assert!(!cfg.flush_trailing_line);
    }

    #[test]
    fn json_overrides_and_passthrough() {
        let cfg = ClientConfig::from_json(
            r#"{
                "method": "GET",
                "headers": {"Authorization": "Bearer t"},
                "retryInterval": 500,
                "query": {"topic": "prices"}
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.method, "GET");
        assert_eq!(cfg.headers.len(), 1);
        assert_eq!(cfg.headers["Authorization"], "Bearer t");
        assert_eq!(cfg.retry_interval_ms, 500);
        assert_eq!(cfg.body.as_deref(), Some("{}"));
        assert_eq!(cfg.options["query"]["topic"], "prices");
    }

    #[test]
    fn object_body_is_serialized() {
        let cfg = ClientConfig::from_json(r#"{"body": {"stream": true}}"#).unwrap();
        assert_eq!(cfg.body.as_deref(), Some(r#"{"stream":true}"#));

        let cfg = ClientConfig::from_json(r#"{"body": null}"#).unwrap();
        assert_eq!(cfg.body, None);
    }

    #[test]
    fn builder_keeps_default_headers() {
        let cfg = ClientConfig::default()
            .with_header("X-Trace", "1")
            .with_retry_interval(Duration::from_millis(250))
            .with_json_body(&serde_json::json!({"q": "x"}));
        assert_eq!(cfg.headers.len(), 3);
        assert_eq!(cfg.retry_interval_ms, 250);
        assert_eq!(cfg.body.as_deref(), Some(r#"{"q":"x"}"#));
    }
}
