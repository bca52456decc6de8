//! The delay used between reconnection attempts.
//!
//! The controller never calls `tokio::time::sleep` directly. It goes through
//! a [`Sleeper`] so tests can record the delays it asks for, or skip them.

use std::future::Future;
use std::time::Duration;

/// Waits for a duration.
pub trait Sleeper: Send + Sync + 'static {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Sleeps on the Tokio timer. Honors a paused test clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
