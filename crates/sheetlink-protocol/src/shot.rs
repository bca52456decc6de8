//! Shot commands: the one action a client takes during a match.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Magnitude of the angular velocity sent with every shot (rad/s).
///
/// The simulator only cares about the direction of the curl, so the client
/// always sends a quarter turn per second and encodes the direction in the
/// sign.
pub const ANGULAR_SPEED: f64 = FRAC_PI_2;

/// Direction the stone is spun.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    /// Clockwise, positive angular velocity.
    #[default]
    Clockwise,
    /// Counter-clockwise, negative angular velocity.
    CounterClockwise,
}

impl Rotation {
    /// Parses the short labels used by shot planners (`"cw"` / `"ccw"`).
    ///
    /// Anything else falls back to clockwise. A planner that emits a typo
    /// still gets a legal shot off before its clock runs out.
    pub fn from_label(label: &str) -> Self {
        match label {
            "cw" => Self::Clockwise,
            "ccw" => Self::CounterClockwise,
            other => {
                tracing::warn!(label = other, "unknown rotation label, using clockwise");
                Self::Clockwise
            }
        }
    }

    /// Signed angular velocity for this direction.
    pub fn angular_velocity(self) -> f64 {
        match self {
            Self::Clockwise => ANGULAR_SPEED,
            Self::CounterClockwise => -ANGULAR_SPEED,
        }
    }
}

/// A shot as sent to `POST /shots`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotCommand {
    /// Release speed in m/s. Never negative.
    pub translational_velocity: f64,
    /// Spin in rad/s; the sign is the curl direction.
    pub angular_velocity: f64,
    /// Release direction in radians.
    pub shot_angle: f64,
}

impl ShotCommand {
    /// Builds a shot from physical quantities.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] if the velocity is
    /// negative or any value is not finite.
    pub fn new(
        translational_velocity: f64,
        angular_velocity: f64,
        shot_angle: f64,
    ) -> Result<Self, ProtocolError> {
        if !translational_velocity.is_finite() || translational_velocity < 0.0 {
            return Err(ProtocolError::InvalidMessage(format!(
                "translational velocity must be a finite value >= 0, got {translational_velocity}"
            )));
        }
        if !angular_velocity.is_finite() || !shot_angle.is_finite() {
            return Err(ProtocolError::InvalidMessage(
                "angular velocity and shot angle must be finite".into(),
            ));
        }
        Ok(Self {
            translational_velocity,
            angular_velocity,
            shot_angle,
        })
    }

    /// Builds a shot from a release velocity vector and a spin direction.
    ///
    /// Speed is the vector's length and the angle is measured from the x
    /// axis, so `(0, v)` is a straight shot up the sheet at `π/2`.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] if a component is not
    /// finite.
    pub fn from_components(vx: f64, vy: f64, rotation: Rotation) -> Result<Self, ProtocolError> {
        Self::new(vx.hypot(vy), rotation.angular_velocity(), vy.atan2(vx))
    }

    /// The spin direction encoded by the sign of `angular_velocity`.
    pub fn rotation(&self) -> Rotation {
        if self.angular_velocity < 0.0 {
            Rotation::CounterClockwise
        } else {
            Rotation::Clockwise
        }
    }
}

/// The previous shot as reported in a [`StateSnapshot`](crate::StateSnapshot).
///
/// Same members as [`ShotCommand`], but the server may report the spin as
/// `null` (or leave it out) when it wasn't recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LastMove {
    pub translational_velocity: f64,
    #[serde(default)]
    pub angular_velocity: Option<f64>,
    pub shot_angle: f64,
}

impl LastMove {
    /// The spin direction, if the spin was reported.
    pub fn rotation(&self) -> Option<Rotation> {
        self.angular_velocity.map(|omega| {
            if omega < 0.0 {
                Rotation::CounterClockwise
            } else {
                Rotation::Clockwise
            }
        })
    }
}

impl From<ShotCommand> for LastMove {
    fn from(shot: ShotCommand) -> Self {
        Self {
            translational_velocity: shot.translational_velocity,
            angular_velocity: Some(shot.angular_velocity),
            shot_angle: shot.shot_angle,
        }
    }
}
