//! ssefetch-core: reconnecting client for line-delimited event streams.
//!
//! # Overview
//!
//! The core crate holds everything except the network:
//!
//! - [`LineFramer`]: splits arbitrarily chunked text into complete lines
//! - [`Utf8Decoder`]: incremental UTF-8 decoding of body chunks
//! - [`Dispatcher`]: listener table with synchronous, ordered fan-out
//! - [`Client`]: connection state machine that turns each line into an
//!   [`EventRecord`] and hands it to listeners
//! - [`ReconnectScheduler`]: fixed-interval retry timer
//! - [`StreamTransport`]: the trait a network backend implements
//!
//! Emitted event types are `"open"`, `"message"`, `"error"` and `"close"`.
//! Every line is a whole event payload; `event:`/`data:`/`id:` fields are
//! not parsed.

pub mod client;
pub mod config;
pub mod decode;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod framer;
pub mod reconnect;
pub mod transport;

pub use client::{Client, ReadyState};
pub use config::ClientConfig;
pub use decode::Utf8Decoder;
pub use dispatcher::{listener, Dispatcher, Listener};
pub use error::{ClientError, ListenerError, TransportError};
pub use event::{kind, Event, EventRecord};
pub use framer::{LineFramer, Lines};
pub use reconnect::ReconnectScheduler;
pub use transport::{ByteStream, StreamRequest, StreamResponse, StreamTransport};
