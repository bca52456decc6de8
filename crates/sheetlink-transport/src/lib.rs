//! Transport abstraction layer for sheetlink.
//!
//! Provides the [`Transport`] and [`Subscription`] traits that hide how the
//! client talks to the match server: two one-shot calls (team registration
//! and shot submission) plus one long-lived push subscription.
//!
//! # Feature Flags
//!
//! - `http` (default): HTTP + server-sent events via `reqwest` and
//!   `eventsource-stream` ([`HttpTransport`])

mod config;
mod error;
#[cfg(feature = "http")]
mod http;

pub use config::{Credentials, TransportConfig};
pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::{HttpSubscription, HttpTransport};

use std::future::Future;

use sheetlink_protocol::{MatchId, ShotCommand, TeamConfig, TeamSide};

/// One event pushed by the server, before any interpretation.
///
/// `event_type` is the SSE `event:` name and `data` the payload text. The
/// session layer decides what both mean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub event_type: String,
    pub data: String,
    /// SSE `id:` field, empty when the server doesn't set one.
    pub id: String,
}

impl RawEvent {
    /// Creates an event without an id.
    pub fn new(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: data.into(),
            id: String::new(),
        }
    }
}

/// Performs the client's calls against the match server.
///
/// Every call is authenticated. One-shot calls make a single attempt; the
/// subscription may retry opening on its own (see
/// [`TransportConfig::max_connect_retries`]).
pub trait Transport: Send + Sync + 'static {
    /// The open push channel produced by [`subscribe`](Self::subscribe).
    type Subscription: Subscription;

    /// Registers the team and returns the side the server assigned, which
    /// may differ from `expected_side`.
    fn register_team(
        &self,
        match_id: MatchId,
        expected_side: TeamSide,
        team: &TeamConfig,
    ) -> impl Future<Output = Result<TeamSide, TransportError>> + Send;

    /// Submits one shot.
    fn submit_shot(
        &self,
        match_id: MatchId,
        shot: &ShotCommand,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Opens the state push channel for a match.
    fn subscribe(
        &self,
        match_id: MatchId,
    ) -> impl Future<Output = Result<Self::Subscription, TransportError>> + Send;
}

/// An open push channel.
///
/// Dropping the subscription releases the underlying connection.
pub trait Subscription: Send + 'static {
    /// Waits for the next pushed event.
    ///
    /// Returns `Ok(None)` when the server ended the stream cleanly.
    fn next_event(&mut self) -> impl Future<Output = Result<Option<RawEvent>, TransportError>> + Send;
}
