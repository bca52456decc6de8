//! The reconnection controller: keeps the state subscription alive.
//!
//! One pass of the loop opens a subscription, feeds every pushed event
//! through the [`EventClassifier`], stores and yields authoritative
//! snapshots, and stops when the subscription fails or ends. The
//! [`SessionConfig`] decision table then says whether to wait and go round
//! again or to stop for good.
//!
//! ```text
//!  Connecting ──ok──→ Streaming ──event──→ classify ──authoritative──→ store + yield
//!      │                  │
//!      │ error            │ timeout / error / clean end / hard disconnect
//!      ▼                  ▼
//!  Disconnected ←── decide() ──abort──→ Aborted
//!      │
//!      └── sleep(delay) ──→ Connecting
//! ```
//!
//! The loop runs inside the returned stream, so it only makes progress
//! while the caller polls. Dropping the stream drops the open subscription
//! with it.

use std::sync::Arc;

use futures_util::Stream;
use sheetlink_protocol::{Codec, JsonCodec, MatchId, StateSnapshot};
use sheetlink_transport::{RawEvent, Subscription, Transport};
use tokio::time::Instant;

use crate::{
    ClassifiedEvent, ConnectionMonitor, ConnectionState, EventClassifier, Interruption,
    RetryDecision, SessionConfig, SessionError, Sleeper, StateStore, TokioSleeper,
};

/// Drives one match's state subscription.
pub struct ReconnectController<T: Transport, S: Sleeper = TokioSleeper, C: Codec = JsonCodec> {
    transport: Arc<T>,
    match_id: MatchId,
    classifier: EventClassifier<C>,
    store: StateStore,
    monitor: ConnectionMonitor,
    sleeper: S,
    config: SessionConfig,
    span: tracing::Span,
}

impl<T: Transport> ReconnectController<T> {
    /// A controller that sleeps on the Tokio timer and decodes JSON.
    pub fn new(transport: Arc<T>, match_id: MatchId, store: StateStore, config: SessionConfig) -> Self {
        Self {
            transport,
            match_id,
            classifier: EventClassifier::new(),
            store,
            monitor: ConnectionMonitor::new(),
            sleeper: TokioSleeper,
            config,
            span: tracing::info_span!("state_stream", %match_id),
        }
    }
}

impl<T: Transport, S: Sleeper, C: Codec> ReconnectController<T, S, C> {
    /// Replaces the delay function.
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> ReconnectController<T, S2, C> {
        ReconnectController {
            transport: self.transport,
            match_id: self.match_id,
            classifier: self.classifier,
            store: self.store,
            monitor: self.monitor,
            sleeper,
            config: self.config,
            span: self.span,
        }
    }

    /// Replaces the payload codec.
    pub fn with_codec<C2: Codec>(self, codec: C2) -> ReconnectController<T, S, C2> {
        ReconnectController {
            transport: self.transport,
            match_id: self.match_id,
            classifier: EventClassifier::with_codec(codec),
            store: self.store,
            monitor: self.monitor,
            sleeper: self.sleeper,
            config: self.config,
            span: self.span,
        }
    }

    /// Reports into `monitor` instead of a private one.
    pub fn with_monitor(mut self, monitor: ConnectionMonitor) -> Self {
        self.monitor = monitor;
        self
    }

    /// Logs under `span` instead of the default `state_stream` span.
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    /// Handle for watching this controller's connection status.
    pub fn monitor(&self) -> ConnectionMonitor {
        self.monitor.clone()
    }

    /// Runs the loop as a stream of authoritative snapshots, in the order
    /// the server sent them.
    ///
    /// The stream ends only on an abort decision (by default: a hard
    /// disconnect). A snapshot with a winner does *not* end it; stopping
    /// after the match is over is up to the caller.
    pub fn into_stream(self) -> impl Stream<Item = StateSnapshot> + Send + 'static {
        let controller = self;

        async_stream::stream! {
            loop {
                controller.monitor.set_state(ConnectionState::Connecting);
                let mut subscription = match controller.transport.subscribe(controller.match_id).await {
                    Ok(subscription) => subscription,
                    Err(e) => {
                        let err = SessionError::from_stream_failure(e);
                        match controller.interrupted(Interruption::of(&err), Some(&err)) {
                            RetryDecision::RetryAfter(delay) => {
                                controller.sleeper.sleep(delay).await;
                                continue;
                            }
                            RetryDecision::Abort => break,
                        }
                    }
                };
                controller.connected();

                let (interruption, err) = loop {
                    match subscription.next_event().await {
                        Ok(Some(raw)) => {
                            if let Some(snapshot) = controller.apply(&raw) {
                                yield snapshot;
                            }
                        }
                        Ok(None) => break (Interruption::Ended, None),
                        Err(e) => {
                            let err = SessionError::from_stream_failure(e);
                            break (Interruption::of(&err), Some(err));
                        }
                    }
                };
                // Release the connection before waiting out the delay.
                drop(subscription);

                match controller.interrupted(interruption, err.as_ref()) {
                    RetryDecision::RetryAfter(delay) => controller.sleeper.sleep(delay).await,
                    RetryDecision::Abort => break,
                }
            }
        }
    }

    /// Subscription opened: close out any outage.
    fn connected(&self) {
        let _enter = self.span.enter();
        self.monitor.set_state(ConnectionState::Streaming);
        match self.monitor.take_downtime(Instant::now()) {
            Some(downtime) => tracing::info!(
                downtime_secs = downtime.as_secs_f64(),
                "reconnected to state stream after {:.4} seconds of disconnection",
                downtime.as_secs_f64()
            ),
            None => tracing::info!("connected to state stream"),
        }
    }

    /// Classifies one event. Returns the snapshot to yield, if any.
    fn apply(&self, raw: &RawEvent) -> Option<StateSnapshot> {
        let _enter = self.span.enter();
        match self.classifier.classify(raw) {
            Ok(ClassifiedEvent::Authoritative(snapshot)) => {
                tracing::debug!(
                    end = snapshot.end_number,
                    shot = snapshot.total_shot_number,
                    next = ?snapshot.next_shot_team,
                    "received latest state"
                );
                self.store.update(snapshot.clone());
                self.monitor.record_snapshot();
                Some(snapshot)
            }
            Ok(ClassifiedEvent::Informational(snapshot)) => {
                tracing::debug!(
                    end = snapshot.end_number,
                    shot = snapshot.total_shot_number,
                    "received state update"
                );
                None
            }
            Ok(ClassifiedEvent::Unrecognized(event_type)) => {
                tracing::trace!(event_type, "ignoring unrecognized event");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed event");
                None
            }
        }
    }

    /// Records an interruption and decides what comes next.
    fn interrupted(&self, interruption: Interruption, err: Option<&SessionError>) -> RetryDecision {
        let _enter = self.span.enter();
        let now = Instant::now();

        match interruption {
            Interruption::Ended => tracing::info!("state stream ended by server"),
            Interruption::Timeout => {
                self.monitor.count_timeout();
                self.monitor.mark_lost(now, false);
            }
            Interruption::Disconnected => {
                self.monitor.count_disconnect();
                self.monitor.mark_lost(now, true);
            }
            Interruption::Failed => {
                self.monitor.count_other_failure();
                self.monitor.mark_lost(now, false);
            }
        }
        if let Some(err) = err {
            tracing::error!(error = %err, "state stream interrupted");
        }

        let decision = self.config.decide(interruption);
        match decision {
            RetryDecision::RetryAfter(delay) => {
                self.monitor.set_state(ConnectionState::Disconnected);
                tracing::debug!(delay_secs = delay.as_secs_f64(), "reconnecting after delay");
            }
            RetryDecision::Abort => {
                self.monitor.set_state(ConnectionState::Aborted);
                tracing::error!("server closed the state stream; giving up. Is the match server still running?");
            }
        }
        decision
    }
}
