use sheetlink_protocol::ProtocolError;

/// Errors that can occur in the transport layer.
///
/// The variants are split by what the caller should do about them, not by
/// which library produced them: a hard disconnect, a timeout, and "any
/// other failure" are handled differently by the reconnection loop.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server closed the connection while a response was in flight.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// No response (or no further event) arrived within the configured
    /// time.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The server rejected the credentials (HTTP 401).
    #[error("unauthorized at {endpoint}; check the username and password")]
    Unauthorized { endpoint: String },

    /// The server answered with a status other than success or 401.
    #[error("unexpected status {status} from {endpoint}")]
    UnexpectedStatus { endpoint: String, status: u16 },

    /// The request could not be completed (connection refused, DNS, TLS,
    /// unreadable body, ...).
    #[cfg(feature = "http")]
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The event stream could not be parsed.
    #[error("event stream error: {0}")]
    Stream(String),

    /// A request or response body could not be encoded/decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl TransportError {
    /// `true` for the hard-disconnect case.
    pub fn is_connection_closed(&self) -> bool {
        matches!(self, Self::ConnectionClosed(_))
    }

    /// `true` when the failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// The HTTP status, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classifies a `reqwest` failure.
    ///
    /// The peer going away (mid-body, or after the request but before any
    /// headers) is the hard-disconnect case. reqwest reports a cut-off body
    /// as a decode or body error, so the cause chain decides. Timeouts keep
    /// their own variant; the rest is a generic request failure.
    #[cfg(feature = "http")]
    pub(crate) fn from_reqwest(endpoint: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout(format!("{endpoint}: {source}"))
        } else if !source.is_connect() && peer_went_away(&source) {
            Self::ConnectionClosed(format!("{endpoint}: {}", root_cause(&source)))
        } else {
            Self::Request {
                endpoint: endpoint.to_string(),
                source,
            }
        }
    }
}

/// Message hyper uses when the connection closes before a response (or
/// its body) is complete. This error carries no I/O cause to inspect.
#[cfg(feature = "http")]
const INCOMPLETE_MESSAGE: &str = "connection closed before message completed";

/// Walks the cause chain looking for a closed or reset connection.
#[cfg(feature = "http")]
fn peer_went_away(err: &reqwest::Error) -> bool {
    use std::error::Error as _;
    use std::io::ErrorKind;

    let mut cause = err.source();
    while let Some(e) = cause {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                ErrorKind::UnexpectedEof
                    | ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::BrokenPipe
            ) {
                return true;
            }
        }
        if e.to_string().contains(INCOMPLETE_MESSAGE) {
            return true;
        }
        cause = e.source();
    }
    false
}

#[cfg(feature = "http")]
fn root_cause(err: &reqwest::Error) -> String {
    use std::error::Error as _;

    let mut last: &dyn std::error::Error = err;
    while let Some(next) = last.source() {
        last = next;
    }
    last.to_string()
}
