//! Event classification: turning a raw pushed event into something the
//! session can act on.
//!
//! The server pushes two kinds of state events. Only one of them is the
//! state the client should act on; the other is a progress echo that is
//! logged and otherwise ignored. Any other event name is unknown and
//! skipped, so the server can add event types without breaking clients.

use sheetlink_protocol::{Codec, JsonCodec, StateSnapshot};
use sheetlink_transport::RawEvent;

use crate::SessionError;

/// Event name of the state the client acts on.
pub const AUTHORITATIVE_EVENT: &str = "latest_state_update";

/// Event name of the progress echo.
pub const INFORMATIONAL_EVENT: &str = "state_update";

/// The known event names, plus a catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// [`AUTHORITATIVE_EVENT`]
    LatestState,
    /// [`INFORMATIONAL_EVENT`]
    StateUpdate,
    /// Anything else.
    Unrecognized,
}

impl EventKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            AUTHORITATIVE_EVENT => Self::LatestState,
            INFORMATIONAL_EVENT => Self::StateUpdate,
            _ => Self::Unrecognized,
        }
    }
}

/// What a raw event turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedEvent {
    /// Replace the stored state with this snapshot and hand it to the
    /// caller.
    Authoritative(StateSnapshot),
    /// Log it, nothing else.
    Informational(StateSnapshot),
    /// Unknown event name (kept for logging).
    Unrecognized(String),
}

/// Classifies raw events. A pure function of its input; holds only the
/// codec used to decode payloads.
#[derive(Debug, Clone, Default)]
pub struct EventClassifier<C: Codec = JsonCodec> {
    codec: C,
}

impl EventClassifier<JsonCodec> {
    pub fn new() -> Self {
        Self { codec: JsonCodec }
    }
}

impl<C: Codec> EventClassifier<C> {
    /// Uses a custom codec for payloads.
    pub fn with_codec(codec: C) -> Self {
        Self { codec }
    }

    /// Decodes and labels one event.
    ///
    /// Unknown event names are not decoded at all.
    ///
    /// # Errors
    /// Returns [`SessionError::MalformedPayload`] when a known event's
    /// payload doesn't decode into a [`StateSnapshot`].
    pub fn classify(&self, raw: &RawEvent) -> Result<ClassifiedEvent, SessionError> {
        let kind = EventKind::from_tag(&raw.event_type);
        if kind == EventKind::Unrecognized {
            return Ok(ClassifiedEvent::Unrecognized(raw.event_type.clone()));
        }

        let snapshot: StateSnapshot =
            self.codec
                .decode(raw.data.as_bytes())
                .map_err(|source| SessionError::MalformedPayload {
                    event_type: raw.event_type.clone(),
                    source,
                })?;

        Ok(match kind {
            EventKind::LatestState => ClassifiedEvent::Authoritative(snapshot),
            _ => ClassifiedEvent::Informational(snapshot),
        })
    }
}
