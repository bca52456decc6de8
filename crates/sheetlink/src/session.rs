//! `MatchSession`: one team's connection to one match.
//!
//! This is the entry point for a client program. It ties together all the
//! layers: transport → session core → protocol types.
//!
//! ```text
//!  register_team ──→ Transport::register_team ──→ assigned side
//!  submit_shot   ──→ Transport::submit_shot
//!  stream_state  ──→ ReconnectController ──→ StateStore ──→ accessors
//! ```
//!
//! One-shot calls and the state stream share the transport, so a shot can
//! go out while the stream is open. Only the stream writes to the store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::Stream;
use parking_lot::RwLock;
use sheetlink_protocol::{
    Coordinate, LastMove, MatchId, ShotCommand, StateSnapshot, TeamConfig, TeamSide,
};
use sheetlink_session::{
    ConnectionMonitor, ConnectionStatus, ReconnectController, SessionConfig, SessionError,
    StateStore,
};
use sheetlink_transport::{HttpTransport, Transport};
use tracing::Instrument;

use crate::{CallError, ClientConfig, SheetlinkError};

/// A registered (or about to be registered) participant in one match.
///
/// # Example
///
/// ```rust,no_run
/// use sheetlink::prelude::*;
///
/// # async fn run(config: ClientConfig, team: TeamConfig) -> Result<(), SheetlinkError> {
/// let session = MatchSession::connect(config)?;
/// let side = session.register_team(&team).await?;
/// assert_eq!(session.assigned_side(), side);
/// # Ok(())
/// # }
/// ```
pub struct MatchSession<T: Transport = HttpTransport> {
    transport: Arc<T>,
    match_id: MatchId,
    requested_side: TeamSide,
    assigned_side: RwLock<Option<TeamSide>>,
    store: StateStore,
    monitor: ConnectionMonitor,
    session_config: SessionConfig,
    stream_taken: AtomicBool,
    span: tracing::Span,
}

impl MatchSession<HttpTransport> {
    /// Builds an HTTP session from `config`. No request is made yet.
    ///
    /// # Errors
    /// Returns [`SheetlinkError::Transport`] if the HTTP client can't be
    /// built.
    pub fn connect(config: ClientConfig) -> Result<Self, SheetlinkError> {
        let transport = HttpTransport::new(config.transport.clone(), config.credentials.clone())?;
        Ok(Self::with_transport(Arc::new(transport), &config))
    }
}

impl<T: Transport> MatchSession<T> {
    /// Builds a session over any transport. The transport settings in
    /// `config` are ignored; the transport is already configured.
    pub fn with_transport(transport: Arc<T>, config: &ClientConfig) -> Self {
        let match_id = config.match_id;
        Self {
            transport,
            match_id,
            requested_side: config.requested_side,
            assigned_side: RwLock::new(None),
            store: StateStore::new(),
            monitor: ConnectionMonitor::new(),
            session_config: config.session.clone(),
            stream_taken: AtomicBool::new(false),
            span: tracing::info_span!("match_session", %match_id),
        }
    }

    /// Logs this session's events under `span` instead of the default
    /// `match_session` span.
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// The side the server confirmed, or the requested side before
    /// registration succeeds.
    pub fn assigned_side(&self) -> TeamSide {
        (*self.assigned_side.read()).unwrap_or(self.requested_side)
    }

    // -----------------------------------------------------------------------
    // One-shot calls
    // -----------------------------------------------------------------------

    /// Registers the team for this match and returns the side the server
    /// assigned, which overrides the requested one.
    ///
    /// The team is sent with `match_team_name` set to the requested side.
    /// A single attempt is made.
    ///
    /// # Errors
    /// - [`CallError::InvalidRequest`] if the team fails validation
    /// - [`CallError::Unauthorized`] on rejected credentials
    /// - [`CallError::ServerUnavailable`] / [`CallError::Rejected`] on other
    ///   failures
    pub async fn register_team(&self, team: &TeamConfig) -> Result<TeamSide, CallError> {
        self.register(team).instrument(self.span.clone()).await
    }

    /// Submits one shot. A single attempt is made.
    ///
    /// Failures are logged here, so the result may be ignored.
    ///
    /// # Errors
    /// Same classes as [`register_team`](Self::register_team).
    pub async fn submit_shot(&self, shot: &ShotCommand) -> Result<(), CallError> {
        self.shoot(shot).instrument(self.span.clone()).await
    }

    async fn register(&self, team: &TeamConfig) -> Result<TeamSide, CallError> {
        if let Err(e) = team.validate() {
            let err = CallError::from(e);
            log_call_failure("registration", &err);
            return Err(err);
        }
        let mut team = team.clone();
        team.match_team_name = self.requested_side;

        match self
            .transport
            .register_team(self.match_id, self.requested_side, &team)
            .await
        {
            Ok(side) => {
                if side != self.requested_side {
                    tracing::info!(
                        requested = %self.requested_side,
                        assigned = %side,
                        "server assigned the other side"
                    );
                }
                tracing::info!(team = %team.team_name, %side, "team registered");
                *self.assigned_side.write() = Some(side);
                Ok(side)
            }
            Err(e) => {
                let err = CallError::from_transport("registration", e);
                log_call_failure("registration", &err);
                Err(err)
            }
        }
    }

    async fn shoot(&self, shot: &ShotCommand) -> Result<(), CallError> {
        match self.transport.submit_shot(self.match_id, shot).await {
            Ok(()) => {
                tracing::debug!(
                    velocity = shot.translational_velocity,
                    angle = shot.shot_angle,
                    spin = shot.angular_velocity,
                    "shot submitted"
                );
                Ok(())
            }
            Err(e) => {
                let err = CallError::from_transport("shot", e);
                log_call_failure("shot", &err);
                Err(err)
            }
        }
    }

    // -----------------------------------------------------------------------
    // State stream
    // -----------------------------------------------------------------------

    /// Starts following the match.
    ///
    /// The returned stream yields every authoritative snapshot in arrival
    /// order and reconnects on its own (see
    /// [`ReconnectController`]). It does not end when the match has a
    /// winner; stop polling it instead. Dropping it closes the connection.
    ///
    /// # Errors
    /// Returns [`SheetlinkError::StreamTaken`] on a second call. A session
    /// streams at most once.
    pub fn stream_state(
        &self,
    ) -> Result<impl Stream<Item = StateSnapshot> + Send + use<T>, SheetlinkError> {
        if self.stream_taken.swap(true, Ordering::AcqRel) {
            return Err(SheetlinkError::StreamTaken);
        }

        let span = tracing::info_span!(parent: &self.span, "state_stream");
        let controller = ReconnectController::new(
            Arc::clone(&self.transport),
            self.match_id,
            self.store.clone(),
            self.session_config.clone(),
        )
        .with_monitor(self.monitor.clone())
        .with_span(span);

        Ok(controller.into_stream())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Handle to the snapshot store. Clones share the same slot.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// The latest authoritative snapshot, if any arrived yet.
    pub fn current(&self) -> Option<Arc<StateSnapshot>> {
        self.store.current()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.monitor.status()
    }

    /// `true` when the latest snapshot names this session's side as the
    /// next to throw.
    pub fn is_my_turn(&self) -> Result<bool, SessionError> {
        Ok(self.store.next_shot_team()? == Some(self.assigned_side()))
    }

    pub fn end_number(&self) -> Result<u32, SessionError> {
        self.store.end_number()
    }

    pub fn shot_number(&self) -> Result<u32, SessionError> {
        self.store.shot_number()
    }

    pub fn total_shot_number(&self) -> Result<u32, SessionError> {
        self.store.total_shot_number()
    }

    /// Per-end scores as `(team0, team1)`.
    pub fn score(&self) -> Result<(Vec<i32>, Vec<i32>), SessionError> {
        self.store.score()
    }

    pub fn next_shot_team(&self) -> Result<Option<TeamSide>, SessionError> {
        self.store.next_shot_team()
    }

    pub fn last_move(&self) -> Result<Option<LastMove>, SessionError> {
        self.store.last_move()
    }

    pub fn winner(&self) -> Result<Option<TeamSide>, SessionError> {
        self.store.winner()
    }

    /// Stone positions as `(team0, team1)`.
    pub fn stone_coordinates(&self) -> Result<(Vec<Coordinate>, Vec<Coordinate>), SessionError> {
        self.store.stone_coordinates()
    }
}

fn log_call_failure(call: &'static str, err: &CallError) {
    match err {
        CallError::Unauthorized => {
            tracing::error!(call, "unauthorized; check the username and password")
        }
        CallError::InvalidRequest(e) => tracing::error!(call, error = %e, "request not sent"),
        CallError::Rejected { status, .. } => {
            tracing::error!(call, status, "server rejected the request")
        }
        other => tracing::error!(call, error = %other, "server unavailable"),
    }
}
