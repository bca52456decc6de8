//! Reconnection policy.
//!
//! Every way a stream can stop is an [`Interruption`]. The policy maps each
//! one to a [`RetryDecision`] without touching the network, so the whole
//! table can be tested on its own.

use std::time::Duration;

use crate::SessionError;

/// What to do when the server closes the stream unexpectedly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisconnectPolicy {
    /// Stop streaming. A hard disconnect is taken to mean the server or the
    /// match is gone.
    #[default]
    Abort,
    /// Treat it like any other failure and reconnect after `delay`.
    Retry { delay: Duration },
}

/// Why a stream stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    /// The server finished the response normally.
    Ended,
    /// No event within the read timeout.
    Timeout,
    /// The server dropped the connection mid-stream.
    Disconnected,
    /// Anything else, including failures to open the stream.
    Failed,
}

impl Interruption {
    /// Maps a stream error to its interruption class.
    pub fn of(err: &SessionError) -> Self {
        match err {
            SessionError::StreamTimeout(_) => Self::Timeout,
            SessionError::StreamDisconnected(_) => Self::Disconnected,
            _ => Self::Failed,
        }
    }

    /// Whether this interruption starts a downtime measurement.
    pub fn is_failure(self) -> bool {
        !matches!(self, Self::Ended)
    }
}

/// The controller's next move after an interruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    Abort,
}

/// Timing and policy for the reconnection loop.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Delay before reconnecting after a timeout.
    pub timeout_delay: Duration,

    /// Delay before reconnecting after any other failure.
    pub error_delay: Duration,

    /// Delay before reopening a stream the server ended cleanly.
    pub graceful_end_delay: Duration,

    /// Handling of hard disconnects.
    pub disconnect_policy: DisconnectPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_delay: Duration::from_secs(1),
            error_delay: Duration::from_secs(5),
            graceful_end_delay: Duration::from_secs(1),
            disconnect_policy: DisconnectPolicy::Abort,
        }
    }
}

impl SessionConfig {
    /// Sets the hard-disconnect policy.
    pub fn disconnect_policy(mut self, policy: DisconnectPolicy) -> Self {
        self.disconnect_policy = policy;
        self
    }

    /// The decision table.
    pub fn decide(&self, interruption: Interruption) -> RetryDecision {
        match interruption {
            Interruption::Ended => RetryDecision::RetryAfter(self.graceful_end_delay),
            Interruption::Timeout => RetryDecision::RetryAfter(self.timeout_delay),
            Interruption::Failed => RetryDecision::RetryAfter(self.error_delay),
            Interruption::Disconnected => match self.disconnect_policy {
                DisconnectPolicy::Abort => RetryDecision::Abort,
                DisconnectPolicy::Retry { delay } => RetryDecision::RetryAfter(delay),
            },
        }
    }
}
