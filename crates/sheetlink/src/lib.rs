//! # sheetlink
//!
//! Client for turn-based remote curling matches.
//!
//! A [`MatchSession`] registers a team, follows the match through a
//! server-pushed state stream that reconnects on its own, and submits shots
//! when it is the team's turn.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures_util::StreamExt;
//! use sheetlink::prelude::*;
//!
//! # async fn run(team: TeamConfig) -> Result<(), SheetlinkError> {
//! let match_id = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap();
//! let config = ClientConfig::new(match_id, Credentials::new("user", "secret"));
//! let session = MatchSession::connect(config)?;
//!
//! let side = session.register_team(&team).await?;
//! let mut states = std::pin::pin!(session.stream_state()?);
//! while let Some(state) = states.next().await {
//!     if state.is_finished() {
//!         break;
//!     }
//!     if state.next_shot_team == Some(side) {
//!         let shot = ShotCommand::from_components(0.1, 2.4, Rotation::Clockwise)?;
//!         let _ = session.submit_shot(&shot).await;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
pub mod logging;
mod session;

pub use config::ClientConfig;
pub use error::{CallError, SheetlinkError};
pub use session::MatchSession;

/// Everything a client program usually needs.
pub mod prelude {
    pub use crate::{CallError, ClientConfig, MatchSession, SheetlinkError};
    pub use sheetlink_protocol::{
        Coordinate, LastMove, MatchId, PlayerConfig, Rotation, ShotCommand, StateSnapshot,
        TeamConfig, TeamSide,
    };
    pub use sheetlink_session::{ConnectionState, ConnectionStatus, DisconnectPolicy, SessionConfig};
    pub use sheetlink_transport::{Credentials, TransportConfig};
}
