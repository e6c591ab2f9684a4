//! Listener table and synchronous fan-out.
//!
//! Dispatch runs every listener registered for a type, in registration
//! order, on the caller's task. Listeners are not isolated from each other:
//! the first one that returns `Err` stops the fan-out for that `emit` call
//! and the error is handed back to whoever emitted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{ClientError, ListenerError};
use crate::event::Event;

/// A registered callback. Identity (for removal) is the `Arc` allocation.
pub type Listener = Arc<dyn Fn(&Event) -> Result<(), ListenerError> + Send + Sync>;

/// Wrap a closure as a [`Listener`].
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Event) -> Result<(), ListenerError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Maps event type names to ordered listener lists.
#[derive(Clone, Default)]
pub struct Dispatcher {
    table: Arc<Mutex<HashMap<String, Vec<Listener>>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `listener` to the list for `event_type`.
    ///
    /// Registering the same listener twice creates two entries.
    pub fn on(&self, event_type: impl Into<String>, listener: Listener) {
        self.table
            .lock()
            .unwrap()
            .entry(event_type.into())
            .or_default()
            .push(listener);
    }

    /// Remove every entry for `event_type` that is the same allocation as
    /// `listener`. No-op if the type or listener is unknown.
    pub fn off(&self, event_type: &str, listener: &Listener) {
        if let Some(list) = self.table.lock().unwrap().get_mut(event_type) {
            list.retain(|l| !same_listener(l, listener));
        }
    }

    /// Invoke every listener for `event_type` with `event`.
    ///
    /// The list is snapshotted first, so listeners may register or remove
    /// listeners while being dispatched; changes apply from the next emit.
    pub fn emit(&self, event_type: &str, event: &Event) -> Result<(), ClientError> {
        let snapshot = match self.table.lock().unwrap().get(event_type) {
            Some(list) if !list.is_empty() => list.clone(),
            _ => return Ok(()),
        };

        for listener in snapshot {
            listener(event).map_err(|source| ClientError::HandlerFailure {
                event_type: event_type.to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Number of listeners currently registered for `event_type`.
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.table
            .lock()
            .unwrap()
            .get(event_type)
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table.lock().unwrap();
        let mut map = f.debug_map();
        for (event_type, list) in table.iter() {
            map.entry(event_type, &list.len());
        }
        map.finish()
    }
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    // Compare data pointers only; vtable addresses are not stable.
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
