//! Fixed-interval reconnection timer.
//!
//! At most one timer is pending at a time. Arming a new one cancels the
//! previous one, and [`ReconnectScheduler::cancel`] stops a pending timer
//! before it fires, so repeated connect/close cycles never leak retries.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Runs a retry future after a fixed delay unless cancelled first.
#[derive(Debug)]
pub struct ReconnectScheduler {
    interval: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

impl ReconnectScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawn a timer that runs `fire` after the interval.
    ///
    /// Once the delay has elapsed `fire` runs to completion; cancellation
    /// only affects the wait.
    pub fn schedule<F>(&self, fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let timer = CancellationToken::new();
        if let Some(previous) = self.pending.lock().unwrap().replace(timer.clone()) {
            previous.cancel();
        }

        let delay = self.interval;
        tracing::debug!(delay_ms = delay.as_millis() as u64, "reconnect scheduled");
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = timer.cancelled() => {
                    tracing::debug!("reconnect timer cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    // Mark as consumed so `is_pending` reports false while firing.
                    timer.cancel();
                    fire.await;
                }
            }
        });
    }

    /// Cancel the pending timer, if any.
    pub fn cancel(&self) {
        if let Some(timer) = self.pending.lock().unwrap().take() {
            timer.cancel();
        }
    }

    /// Returns `true` while a timer is waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|timer| !timer.is_cancelled())
    }
}

impl Drop for ReconnectScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
