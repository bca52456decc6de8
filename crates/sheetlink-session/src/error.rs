//! Error types for the session layer.

use sheetlink_protocol::ProtocolError;
use sheetlink_transport::TransportError;

/// Errors that can occur while streaming and reading match state.
///
/// Only [`StreamDisconnected`](Self::StreamDisconnected) can end a stream
/// (and only under [`DisconnectPolicy::Abort`](crate::DisconnectPolicy)).
/// Everything else is logged and recovered from inside the loop.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A state accessor was called before the first authoritative snapshot
    /// arrived. Callers should treat this as "not yet", not as fatal.
    #[error("no match state received yet")]
    NoStateYet,

    /// An event's payload does not have the snapshot shape. The event is
    /// dropped and the stream continues.
    #[error("malformed {event_type} payload: {source}")]
    MalformedPayload {
        event_type: String,
        #[source]
        source: ProtocolError,
    },

    /// The stream went quiet for too long. Retried after a short delay.
    #[error("state stream timed out: {0}")]
    StreamTimeout(#[source] TransportError),

    /// The server closed the stream unexpectedly.
    #[error("state stream disconnected: {0}")]
    StreamDisconnected(#[source] TransportError),

    /// Any other failure while opening or reading the stream. Retried
    /// after a long delay.
    #[error("state stream failed: {0}")]
    StreamOther(#[source] TransportError),
}

impl SessionError {
    /// Sorts a transport failure into the stream failure classes.
    pub fn from_stream_failure(err: TransportError) -> Self {
        if err.is_connection_closed() {
            Self::StreamDisconnected(err)
        } else if err.is_timeout() {
            Self::StreamTimeout(err)
        } else {
            Self::StreamOther(err)
        }
    }
}
