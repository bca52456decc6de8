//! Match setup: the document that creates a match on the server.

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Which ruleset a match is played under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Four players per side, eight stones per end.
    #[default]
    Standard,
    /// Two players per side with pre-positioned stones.
    MixDoubles,
}

/// Named layouts for the stones placed before each mixed-doubles end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionedStones {
    CenterGuard,
    CenterHouse,
    PpLeft,
    PpRight,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentInfo {
    pub tournament_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorInfo {
    pub simulator_name: String,
}

/// Parameters for a new match.
///
/// Time limits are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSetup {
    #[serde(default)]
    pub game_mode: GameMode,
    pub tournament: TournamentInfo,
    pub simulator: SimulatorInfo,
    pub applied_rule: String,
    pub time_limit: f64,
    pub extra_end_time_limit: f64,
    pub standard_end_count: u32,
    pub match_name: String,
    /// Pre-positioned stone pattern id. Mixed doubles only.
    #[serde(default)]
    pub positioned_stones_pattern: Option<u32>,
}

impl MatchSetup {
    /// Checks mode-dependent fields and limits.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] when a mixed-doubles match
    /// has no stone pattern, a standard match has one, or a time limit or
    /// end count is not positive.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match (self.game_mode, self.positioned_stones_pattern) {
            (GameMode::MixDoubles, None) => {
                return Err(ProtocolError::InvalidMessage(
                    "positioned_stones_pattern is required when game_mode is mix_doubles".into(),
                ));
            }
            (GameMode::Standard, Some(_)) => {
                return Err(ProtocolError::InvalidMessage(
                    "positioned_stones_pattern must be null when game_mode is not mix_doubles"
                        .into(),
                ));
            }
            _ => {}
        }
        if !(self.time_limit > 0.0 && self.extra_end_time_limit > 0.0) {
            return Err(ProtocolError::InvalidMessage("time limits must be positive".into()));
        }
        if self.standard_end_count == 0 {
            return Err(ProtocolError::InvalidMessage("standard_end_count must be at least 1".into()));
        }
        Ok(())
    }
}
