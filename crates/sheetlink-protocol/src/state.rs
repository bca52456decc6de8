//! Match state types: what the server pushes after every shot.
//!
//! A [`StateSnapshot`] is an immutable value. The client never patches one
//! in place; a newer snapshot simply replaces the older one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies one match on the server.
///
/// Newtype over a UUID so a match id can't be confused with any other
/// string floating around the client. Serialized as the bare UUID text,
/// which is also what `match_id.json` contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(Uuid);

impl MatchId {
    /// Wraps an existing UUID.
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID.
    pub fn into_inner(self) -> Uuid {
        self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Hyphenated form: this is what goes into URLs and query strings.
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for MatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// One of the two sides in a match.
///
/// `Team0` throws first in the first end. The server may put a client on
/// the other side than it asked for (if the opponent claimed it first), so
/// the side confirmed at registration is the one that counts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    /// First to throw in the first end.
    Team0,
    /// Second to throw in the first end. Requested by default.
    #[default]
    Team1,
}

impl TeamSide {
    /// The wire name (`"team0"` / `"team1"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Team0 => "team0",
            Self::Team1 => "team1",
        }
    }

    /// The other side.
    pub fn opponent(self) -> Self {
        match self {
            Self::Team0 => Self::Team1,
            Self::Team1 => Self::Team0,
        }
    }
}

impl fmt::Display for TeamSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Board state
// ---------------------------------------------------------------------------

/// A stone position on the sheet, in the simulator's coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

/// Per-end scores for both sides.
///
/// `first_team_score` belongs to [`TeamSide::Team0`] and
/// `second_team_score` to [`TeamSide::Team1`]. Index `i` is end `i`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    #[serde(default)]
    pub first_team_score: Vec<i32>,
    #[serde(default)]
    pub second_team_score: Vec<i32>,
}

impl Score {
    /// Scores of one side, end by end.
    pub fn for_side(&self, side: TeamSide) -> &[i32] {
        match side {
            TeamSide::Team0 => &self.first_team_score,
            TeamSide::Team1 => &self.second_team_score,
        }
    }

    /// Sum of one side's end scores.
    pub fn total(&self, side: TeamSide) -> i32 {
        self.for_side(side).iter().sum()
    }
}

/// The stones in play, grouped by side.
///
/// On the wire this is `{"data": {"team0": [...], "team1": [...]}}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StonePositions {
    #[serde(default)]
    pub data: StonesBySide,
}

/// Inner map of [`StonePositions`]. A side with no stones in play may be
/// omitted by the server.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StonesBySide {
    #[serde(default)]
    pub team0: Vec<Coordinate>,
    #[serde(default)]
    pub team1: Vec<Coordinate>,
}

impl StonePositions {
    /// Stones of one side, in the order the server listed them.
    pub fn for_side(&self, side: TeamSide) -> &[Coordinate] {
        match side {
            TeamSide::Team0 => &self.data.team0,
            TeamSide::Team1 => &self.data.team1,
        }
    }
}

// ---------------------------------------------------------------------------
// StateSnapshot
// ---------------------------------------------------------------------------

/// The server's view of match progress at one point in time.
///
/// The three counters are required; every other member may be absent and
/// falls back to empty/`None`. Members the client doesn't know are ignored,
/// so the server can add fields without breaking older clients.
///
/// Once `winner_team` is set the match is over. The server may keep
/// pushing, but nothing after that point matters for play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub end_number: u32,
    pub shot_number: u32,
    pub total_shot_number: u32,
    #[serde(default)]
    pub next_shot_team: Option<TeamSide>,
    #[serde(default)]
    pub last_move: Option<crate::LastMove>,
    #[serde(default)]
    pub winner_team: Option<TeamSide>,
    #[serde(default)]
    pub score: Score,
    #[serde(default)]
    pub stone_coordinate: StonePositions,
}

impl StateSnapshot {
    /// `true` once the server has declared a winner.
    pub fn is_finished(&self) -> bool {
        self.winner_team.is_some()
    }
}
