//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means the problem is in the data itself: it
//! could not be encoded, could not be decoded, or broke a validation rule.
//! Networking problems live in the transport crate.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields such as
    /// `end_number`, or a side name other than `team0`/`team1`.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The document parsed but violates a rule, e.g. a negative shot
    /// velocity or a three-player team.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
