//! Streaming client: one connection attempt at a time, fan-out to listeners,
//! fixed-interval reconnection.
//!
//! State transitions:
//! - `Idle`/`Closed` → `Connecting`: [`Client::connect`]
//! - `Connecting` → `Open`:          2xx response with a readable body
//! - `Connecting`/`Open` → `Error`:  connection refused, non-2xx, read failure
//! - `Open` → `Closed`:              end of stream
//! - any → `Closed`:                 [`Client::close`]
//!
//! Failures and clean stream ends arm the reconnection timer unless the
//! client was closed. Cancellation caused by `close()` is silent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::decode::Utf8Decoder;
use crate::dispatcher::{Dispatcher, Listener};
use crate::error::ClientError;
use crate::event::{kind, Event, EventRecord};
use crate::framer::LineFramer;
use crate::reconnect::ReconnectScheduler;
use crate::transport::{StreamRequest, StreamTransport};

/// Client lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// Never connected.
    Idle,
    /// Request issued, response not yet validated.
    Connecting,
    /// Streaming lines to listeners.
    Open,
    /// Ended by the server or by `close()`.
    Closed,
    /// Last attempt failed; a retry may be pending.
    Error,
}

impl std::fmt::Display for ReadyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Error => write!(f, "error"),
        }
    }
}

struct ClientInner {
    url: String,
    config: ClientConfig,
    transport: Arc<dyn StreamTransport>,
    dispatcher: Dispatcher,
    scheduler: ReconnectScheduler,
    connected: AtomicBool,
    closed: AtomicBool,
    cancel: Mutex<Option<CancellationToken>>,
    state: Mutex<ReadyState>,
    last_event_id: Mutex<String>,
}

/// Reconnecting event-stream client.
///
/// Cloning is cheap and every clone drives the same connection, listener
/// table and retry timer.
///
/// # Example
/// ```no_run
/// # use std::sync::Arc;
/// # use ssefetch_core::{listener, Client, ClientConfig, StreamTransport};
/// # async fn run(transport: Arc<dyn StreamTransport>) {
/// let client = Client::new("https://example.com/stream", ClientConfig::default(), transport);
/// client.add_event_listener("message", listener(|event| {
///     if let Some(record) = event.as_message() {
///         println!("{}", record.data);
///     }
///     Ok(())
/// }));
/// let _ = client.connect().await;
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    pub fn new(
        url: impl Into<String>,
        config: ClientConfig,
        transport: Arc<dyn StreamTransport>,
    ) -> Self {
        let scheduler = ReconnectScheduler::new(config.retry_interval());
        Self {
            inner: Arc::new(ClientInner {
                url: url.into(),
                config,
                transport,
                dispatcher: Dispatcher::new(),
                scheduler,
                connected: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                cancel: Mutex::new(None),
                state: Mutex::new(ReadyState::Idle),
                last_event_id: Mutex::new(String::new()),
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn ready_state(&self) -> ReadyState {
        *self.inner.state.lock().unwrap()
    }

    /// `true` between response validation and the end of that stream.
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// `true` while a reconnection timer is waiting to fire.
    pub fn reconnect_pending(&self) -> bool {
        self.inner.scheduler.is_pending()
    }

    /// Id of the most recently dispatched record; empty before the first.
    pub fn last_event_id(&self) -> String {
        self.inner.last_event_id.lock().unwrap().clone()
    }

    pub fn add_event_listener(&self, event_type: impl Into<String>, listener: Listener) {
        self.inner.dispatcher.on(event_type, listener);
    }

    pub fn remove_event_listener(&self, event_type: &str, listener: &Listener) {
        self.inner.dispatcher.off(event_type, listener);
    }

    /// Dispatch `event` to the listeners registered for `event_type`.
    ///
    /// Returns the first listener failure; listeners after it are skipped.
    pub fn emit(&self, event_type: &str, event: &Event) -> Result<(), ClientError> {
        self.inner.dispatcher.emit(event_type, event)
    }

    /// Run one connection attempt to completion.
    ///
    /// Transport failures are reported through the `"error"` event and
    /// schedule a reconnection; they never make this call fail. The only
    /// `Err` is a [`ClientError::HandlerFailure`] raised by an `"error"` or
    /// `"close"` listener.
    ///
    /// A previous attempt that is still running is not cancelled, only
    /// superseded; call [`close`](Self::close) first to stop it.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let inner = &self.inner;
        inner.closed.store(false, Ordering::SeqCst);

        let cancel = CancellationToken::new();
        *inner.cancel.lock().unwrap() = Some(cancel.clone());
        self.set_state(ReadyState::Connecting);
        info!(url = %inner.url, method = %inner.config.method, "SSE connecting");

        let mut opened = false;
        let result = self.run_attempt(&cancel, &mut opened).await;

        let mut outcome = Ok(());
        let reconnect = match result {
            Ok(()) => {
                info!(url = %inner.url, "SSE stream ended");
                self.set_state(ReadyState::Closed);
                true
            }
            Err(err) if err.is_cancelled() => {
                debug!(url = %inner.url, "SSE attempt cancelled");
                self.set_state(ReadyState::Closed);
                false
            }
            Err(err) => {
                warn!(url = %inner.url, error = %err, "SSE attempt failed");
                self.set_state(ReadyState::Error);
                let retry = err.is_retryable();
                let event = Event::Error(Arc::new(err));
                if let Err(e) = inner.dispatcher.emit(kind::ERROR, &event) {
                    outcome = Err(e);
                }
                retry
            }
        };

        if opened {
            inner.connected.store(false, Ordering::SeqCst);
            if let Err(e) = inner.dispatcher.emit(kind::CLOSE, &Event::Close) {
                if outcome.is_ok() {
                    outcome = Err(e);
                }
            }
        }

        if reconnect && !inner.closed.load(Ordering::SeqCst) {
            warn!(
                url = %inner.url,
                retry_in_ms = inner.config.retry_interval_ms,
                "SSE reconnecting after interval"
            );
            inner.scheduler.schedule(self.clone().retry());
        }

        outcome
    }

    /// Stop the current attempt and any pending reconnection.
    ///
    /// The attempt unwinds without emitting `"error"`. If it had opened, its
    /// cleanup still emits `"close"`.
    pub fn close(&self) {
        let inner = &self.inner;
        info!(url = %inner.url, "SSE close requested");
        inner.closed.store(true, Ordering::SeqCst);
        inner.connected.store(false, Ordering::SeqCst);
        inner.scheduler.cancel();
        if let Some(cancel) = inner.cancel.lock().unwrap().as_ref() {
            cancel.cancel();
        }
        self.set_state(ReadyState::Closed);
    }

    /// Future run by the reconnection timer.
    fn retry(self) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            if self.is_connected() || self.inner.closed.load(Ordering::SeqCst) {
                debug!(url = %self.inner.url, "SSE reconnect skipped");
                return;
            }
            if let Err(err) = self.connect().await {
                warn!(error = %err, "listener failed during reconnect attempt");
            }
        })
    }

    /// One connection attempt. `Ok` means the server ended the body;
    /// `Err(ClientError::Cancelled)` means `close()` stopped it.
    async fn run_attempt(
        &self,
        cancel: &CancellationToken,
        opened: &mut bool,
    ) -> Result<(), ClientError> {
        let inner = &self.inner;
        let request = StreamRequest::from_config(inner.url.clone(), &inner.config);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            res = inner.transport.open(&request, cancel.clone()) => res,
        };
        let response = match response {
            Ok(response) => response,
            Err(err) if err.is_cancelled() => return Err(ClientError::Cancelled),
            Err(err) => {
                return Err(ClientError::ConnectionFailed {
                    url: inner.url.clone(),
                    status: None,
                    reason: err.to_string(),
                })
            }
        };

        let status = response.status;
        if !response.is_success() {
            return Err(ClientError::ConnectionFailed {
                url: inner.url.clone(),
                status: Some(status),
                reason: format!("HTTP {status}"),
            });
        }
        let Some(mut body) = response.body else {
            return Err(ClientError::ConnectionFailed {
                url: inner.url.clone(),
                status: Some(status),
                reason: "response has no readable body".into(),
            });
        };

        inner.connected.store(true, Ordering::SeqCst);
        *opened = true;
        self.set_state(ReadyState::Open);
        info!(url = %inner.url, status, "SSE connection established");
        inner.dispatcher.emit(kind::OPEN, &Event::Open)?;

        let mut decoder = Utf8Decoder::new();
        let mut framer = LineFramer::new();
        while inner.connected.load(Ordering::SeqCst) {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                chunk = body.next() => chunk,
            };
            let Some(chunk) = chunk else { break };
            let text = decoder.decode(&chunk?);
            for line in framer.feed(&text) {
                if cancel.is_cancelled() {
                    return Err(ClientError::Cancelled);
                }
                self.dispatch_line(line)?;
            }
        }

        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        if inner.config.flush_trailing_line {
            let tail = decoder.finish();
            let mut lines: Vec<String> = framer.feed(&tail).collect();
            lines.extend(framer.finish());
            for line in lines {
                self.dispatch_line(line)?;
            }
        } else if !framer.remainder().is_empty() {
            debug!(
                discarded_len = framer.remainder().len(),
                "SSE stream ended with unterminated line"
            );
        }

        Ok(())
    }

    /// Turn one line into a record and dispatch it. Empty lines are skipped.
    fn dispatch_line(&self, line: String) -> Result<(), ClientError> {
        let record = EventRecord::from_line(line, self.inner.config.retry_interval_ms);
        if record.data.is_empty() {
            return Ok(());
        }
        debug!(len = record.data.len(), "SSE line received");
        *self.inner.last_event_id.lock().unwrap() = record.id.clone();
        self.inner
            .dispatcher
            .emit(kind::MESSAGE, &Event::Message(record))
    }

    fn set_state(&self, state: ReadyState) {
        *self.inner.state.lock().unwrap() = state;
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.inner.url)
            .field("state", &self.ready_state())
            .field("connected", &self.is_connected())
            .field("listeners", &self.inner.dispatcher)
            .finish()
    }
}
