//! The latest authoritative match state.
//!
//! # Concurrency note
//!
//! The streaming task writes and any number of handles read, possibly from
//! other threads. The store holds an `Arc<StateSnapshot>` behind a
//! read-mostly lock and swaps the whole `Arc` on update; every accessor
//! reads from one `Arc`, so a reader never sees fields from two different
//! updates.

use std::sync::Arc;

use parking_lot::RwLock;
use sheetlink_protocol::{Coordinate, LastMove, StateSnapshot, TeamSide};

use crate::SessionError;

/// Holds the single latest snapshot.
///
/// Cloning is cheap and clones share the same slot. Only the reconnect
/// controller writes to it.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    current: Arc<RwLock<Option<Arc<StateSnapshot>>>>,
}

impl StateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the held snapshot. Last write wins; nothing is merged.
    pub(crate) fn update(&self, snapshot: StateSnapshot) {
        *self.current.write() = Some(Arc::new(snapshot));
    }

    /// The latest snapshot, or `None` before the first one.
    pub fn current(&self) -> Option<Arc<StateSnapshot>> {
        self.current.read().clone()
    }

    /// `true` once at least one snapshot has been stored.
    pub fn has_state(&self) -> bool {
        self.current.read().is_some()
    }

    fn snapshot(&self) -> Result<Arc<StateSnapshot>, SessionError> {
        self.current().ok_or(SessionError::NoStateYet)
    }

    pub fn end_number(&self) -> Result<u32, SessionError> {
        Ok(self.snapshot()?.end_number)
    }

    /// Shot number within the current end.
    pub fn shot_number(&self) -> Result<u32, SessionError> {
        Ok(self.snapshot()?.shot_number)
    }

    /// Shots taken since the start of the match.
    pub fn total_shot_number(&self) -> Result<u32, SessionError> {
        Ok(self.snapshot()?.total_shot_number)
    }

    /// Per-end scores as `(team0, team1)`.
    pub fn score(&self) -> Result<(Vec<i32>, Vec<i32>), SessionError> {
        let s = self.snapshot()?;
        Ok((
            s.score.first_team_score.clone(),
            s.score.second_team_score.clone(),
        ))
    }

    pub fn next_shot_team(&self) -> Result<Option<TeamSide>, SessionError> {
        Ok(self.snapshot()?.next_shot_team)
    }

    pub fn last_move(&self) -> Result<Option<LastMove>, SessionError> {
        Ok(self.snapshot()?.last_move)
    }

    /// The winner once the match has ended.
    pub fn winner(&self) -> Result<Option<TeamSide>, SessionError> {
        Ok(self.snapshot()?.winner_team)
    }

    /// Stone positions as `(team0, team1)`, each in server order.
    pub fn stone_coordinates(&self) -> Result<(Vec<Coordinate>, Vec<Coordinate>), SessionError> {
        let s = self.snapshot()?;
        Ok((
            s.stone_coordinate.for_side(TeamSide::Team0).to_vec(),
            s.stone_coordinate.for_side(TeamSide::Team1).to_vec(),
        ))
    }
}
