//! Codec trait and implementations for serializing/deserializing documents.
//!
//! The match server speaks JSON today, but nothing above this module needs
//! to know that. The session layer decodes push payloads through whatever
//! [`Codec`] it was given, which also lets tests feed hand-written bytes.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds
///
/// - `Send + Sync` → the codec is shared with the streaming task, which
///   Tokio may poll on any worker thread.
/// - `'static` → it owns everything it needs, so it can live inside a
///   long-running stream.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`), the format of every
/// document the match server sends.
///
/// ## Example
///
/// ```rust
/// use sheetlink_protocol::{Codec, JsonCodec, TeamSide};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&TeamSide::Team0).unwrap();
/// assert_eq!(bytes, br#""team0""#);
///
/// let side: TeamSide = codec.decode(&bytes).unwrap();
/// assert_eq!(side, TeamSide::Team0);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
