//! Team configuration sent once at registration.

use serde::{Deserialize, Serialize};

use crate::{GameMode, ProtocolError, TeamSide};

/// One thrower's characteristics as understood by the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Upper bound on release speed (m/s).
    pub max_velocity: f64,
    /// Standard deviation applied to the release speed.
    pub shot_std_dev: f64,
    /// Standard deviation applied to the release angle.
    pub angle_std_dev: f64,
    pub player_name: String,
}

impl PlayerConfig {
    fn validate(&self, slot: &str) -> Result<(), ProtocolError> {
        if self.player_name.trim().is_empty() {
            return Err(ProtocolError::InvalidMessage(format!("{slot}: player name is empty")));
        }
        let numbers = [
            ("max_velocity", self.max_velocity),
            ("shot_std_dev", self.shot_std_dev),
            ("angle_std_dev", self.angle_std_dev),
        ];
        for (field, value) in numbers {
            if !value.is_finite() || value < 0.0 {
                return Err(ProtocolError::InvalidMessage(format!(
                    "{slot}: {field} must be a finite value >= 0, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// The document posted to `/store-team-config`.
///
/// A standard team has four players. A mixed-doubles team has two and
/// leaves `player3`/`player4` empty; the server accepts either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamConfig {
    /// Ask the server to ignore the player values and use its defaults.
    pub use_default_config: bool,
    /// Display name of the team.
    pub team_name: String,
    /// The side this client would like to play.
    #[serde(default)]
    pub match_team_name: TeamSide,
    pub player1: PlayerConfig,
    pub player2: PlayerConfig,
    #[serde(default)]
    pub player3: Option<PlayerConfig>,
    #[serde(default)]
    pub player4: Option<PlayerConfig>,
}

impl TeamConfig {
    /// Standard when four players are present, mixed doubles when two are.
    pub fn game_mode(&self) -> GameMode {
        if self.player3.is_some() {
            GameMode::Standard
        } else {
            GameMode::MixDoubles
        }
    }

    /// All configured players, in throwing order.
    pub fn players(&self) -> impl Iterator<Item = &PlayerConfig> {
        [Some(&self.player1), Some(&self.player2), self.player3.as_ref(), self.player4.as_ref()]
            .into_iter()
            .flatten()
    }

    /// Checks the team before it is sent.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] if the team name is empty,
    /// only one of `player3`/`player4` is set, or a player value is
    /// negative/non-finite.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.team_name.trim().is_empty() {
            return Err(ProtocolError::InvalidMessage("team name is empty".into()));
        }
        if self.player3.is_some() != self.player4.is_some() {
            return Err(ProtocolError::InvalidMessage(
                "a team has either two or four players; set both player3 and player4 or neither"
                    .into(),
            ));
        }
        let slots = ["player1", "player2", "player3", "player4"];
        for (slot, player) in slots.iter().zip(self.players()) {
            player.validate(slot)?;
        }
        Ok(())
    }
}
