//! Match-state session core for sheetlink.
//!
//! This crate keeps a client's view of the match up to date:
//!
//! 1. **Classification**: deciding what a pushed event means
//!    ([`EventClassifier`])
//! 2. **State**: holding the latest authoritative snapshot ([`StateStore`])
//! 3. **Reconnection**: keeping the push subscription alive and measuring
//!    how long it was down ([`ReconnectController`], [`ConnectionMonitor`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Match session (above)  ← registers, shoots, pulls snapshots
//!     ↕
//! Session core (this crate)  ← classify → store → yield, retry on failure
//!     ↕
//! Transport (below)  ← HTTP calls and the SSE subscription
//! ```

mod classifier;
mod config;
mod controller;
mod delay;
mod error;
mod monitor;
mod store;

pub use classifier::{
    AUTHORITATIVE_EVENT, ClassifiedEvent, EventClassifier, EventKind, INFORMATIONAL_EVENT,
};
pub use config::{DisconnectPolicy, Interruption, RetryDecision, SessionConfig};
pub use controller::ReconnectController;
pub use delay::{Sleeper, TokioSleeper};
pub use error::SessionError;
pub use monitor::{ConnectionMonitor, ConnectionState, ConnectionStatus};
pub use store::StateStore;
