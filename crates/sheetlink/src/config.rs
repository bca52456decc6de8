//! Client configuration.

use sheetlink_protocol::{MatchId, TeamSide};
use sheetlink_session::SessionConfig;
use sheetlink_transport::{Credentials, TransportConfig};
use tracing::Level;

/// Everything a [`MatchSession`](crate::MatchSession) needs, supplied once
/// at construction.
///
/// # Example
///
/// ```rust
/// use sheetlink::prelude::*;
///
/// let match_id: MatchId = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap();
/// let config = ClientConfig::new(match_id, Credentials::new("user", "secret"))
///     .base_url("http://curling.example:5000")
///     .requested_side(TeamSide::Team0);
/// assert_eq!(config.transport.base_url, "http://curling.example:5000");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub match_id: MatchId,
    pub credentials: Credentials,
    /// The side to ask for at registration. The server may assign the
    /// other one.
    pub requested_side: TeamSide,
    /// Default verbosity for [`logging::init`](crate::logging::init).
    pub log_level: Level,
    pub transport: TransportConfig,
    pub session: SessionConfig,
}

impl ClientConfig {
    /// Default settings for the given match and credentials.
    pub fn new(match_id: MatchId, credentials: Credentials) -> Self {
        Self {
            match_id,
            credentials,
            requested_side: TeamSide::default(),
            log_level: Level::INFO,
            transport: TransportConfig::default(),
            session: SessionConfig::default(),
        }
    }

    pub fn requested_side(mut self, side: TeamSide) -> Self {
        self.requested_side = side;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.transport.base_url = url.into();
        self
    }

    pub fn log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    pub fn transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    pub fn session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }
}
