//! Wire protocol for sheetlink.
//!
//! This crate defines the documents a curling client exchanges with the
//! match server:
//!
//! - **Match state** ([`StateSnapshot`], [`Score`], [`StonePositions`]):
//!   what the server pushes after every shot.
//! - **Commands** ([`ShotCommand`], [`TeamConfig`]): what the client sends.
//! - **Match setup** ([`MatchSetup`]): the document that creates a match.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those documents are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer knows nothing about HTTP or reconnection. It only
//! knows the shape of the data and the rules a document must satisfy
//! before it is sent.
//!
//! ```text
//! Transport (HTTP/SSE) → Protocol (StateSnapshot) → Session (latest state)
//! ```

mod codec;
mod error;
mod setup;
mod shot;
mod state;
mod team;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use setup::{GameMode, MatchSetup, PositionedStones, SimulatorInfo, TournamentInfo};
pub use shot::{ANGULAR_SPEED, LastMove, Rotation, ShotCommand};
pub use state::{Coordinate, MatchId, Score, StateSnapshot, StonePositions, StonesBySide, TeamSide};
pub use team::{PlayerConfig, TeamConfig};
