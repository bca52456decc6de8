//! Unified error types for the sheetlink client.

use sheetlink_protocol::ProtocolError;
use sheetlink_session::SessionError;
use sheetlink_transport::TransportError;

/// Why a one-shot call (registration or shot submission) failed.
///
/// Failed calls are logged where they happen. Code that fires a shot and
/// moves on can ignore this value.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// The server rejected the credentials.
    #[error("unauthorized; check the username and password")]
    Unauthorized,

    /// The server couldn't be reached or dropped the connection.
    #[error("server unavailable: {0}")]
    ServerUnavailable(#[source] TransportError),

    /// The server answered with a failure status.
    #[error("{call} rejected with status {status}")]
    Rejected { call: &'static str, status: u16 },

    /// The request failed validation before it was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] ProtocolError),

    /// The server accepted the call but its answer could not be read.
    #[error("invalid response: {0}")]
    InvalidResponse(#[source] TransportError),
}

impl CallError {
    /// Sorts a transport failure from a one-shot call.
    pub(crate) fn from_transport(call: &'static str, err: TransportError) -> Self {
        match err {
            TransportError::Unauthorized { .. } => Self::Unauthorized,
            TransportError::UnexpectedStatus { status, .. } => Self::Rejected { call, status },
            TransportError::Protocol(_) => Self::InvalidResponse(err),
            other => Self::ServerUnavailable(other),
        }
    }
}

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SheetlinkError {
    /// A transport-level error (client setup, connection).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, validation).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (no state yet, stream failures).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A one-shot call failed.
    #[error(transparent)]
    Call(#[from] CallError),

    /// `stream_state` was already called on this session. Create a new
    /// session to stream again.
    #[error("the state stream of this session was already taken")]
    StreamTaken,
}
