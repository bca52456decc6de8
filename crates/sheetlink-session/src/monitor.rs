//! Connection status of the state stream.
//!
//! The reconnect controller is the only writer. Everything else gets a
//! read-only [`ConnectionMonitor`] and takes copies with
//! [`ConnectionMonitor::status`].

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Where the reconnection loop currently is.
///
/// ```text
///   Idle ─→ Connecting ─→ Streaming ─→ Disconnected ─→ Connecting ...
///                │             │
///                └─────────────┴─→ Aborted (hard disconnect, terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// The stream hasn't been polled yet.
    #[default]
    Idle,
    /// Opening the subscription.
    Connecting,
    /// Subscription open, events flowing.
    Streaming,
    /// Waiting out a retry delay.
    Disconnected,
    /// Stopped for good.
    Aborted,
}

/// A copy of the controller's bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// When the stream was last known to be down. Cleared once a
    /// reconnection succeeds.
    pub lost_at: Option<Instant>,
    /// Downtime measured at the most recent reconnection.
    pub last_downtime: Option<Duration>,
    /// Successful reconnections after a failure.
    pub reconnects: u64,
    pub timeouts: u64,
    pub disconnects: u64,
    pub other_failures: u64,
    /// Authoritative snapshots stored and yielded.
    pub snapshots: u64,
}

/// Shared handle to a controller's [`ConnectionStatus`].
#[derive(Debug, Clone, Default)]
pub struct ConnectionMonitor {
    inner: Arc<Mutex<ConnectionStatus>>,
}

impl ConnectionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the current status.
    pub fn status(&self) -> ConnectionStatus {
        self.inner.lock().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    pub(crate) fn set_state(&self, state: ConnectionState) {
        self.inner.lock().state = state;
    }

    pub(crate) fn record_snapshot(&self) {
        self.inner.lock().snapshots += 1;
    }

    /// Records a failure at `now`.
    ///
    /// With `overwrite` the mark moves to `now`; otherwise an existing mark
    /// is kept so the downtime covers the whole outage.
    pub(crate) fn mark_lost(&self, now: Instant, overwrite: bool) {
        let mut status = self.inner.lock();
        if overwrite || status.lost_at.is_none() {
            status.lost_at = Some(now);
        }
    }

    pub(crate) fn count_timeout(&self) {
        self.inner.lock().timeouts += 1;
    }

    pub(crate) fn count_disconnect(&self) {
        self.inner.lock().disconnects += 1;
    }

    pub(crate) fn count_other_failure(&self) {
        self.inner.lock().other_failures += 1;
    }

    /// Clears the loss mark and returns the downtime it measured, if any.
    pub(crate) fn take_downtime(&self, now: Instant) -> Option<Duration> {
        let mut status = self.inner.lock();
        let lost_at = status.lost_at.take()?;
        let downtime = now.saturating_duration_since(lost_at);
        status.last_downtime = Some(downtime);
        status.reconnects += 1;
        Some(downtime)
    }
}
