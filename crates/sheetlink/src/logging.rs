//! Log output for client programs.
//!
//! The library crates only emit `tracing` events. A program decides where
//! they go, usually by calling [`init`] once at startup.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Installs a formatted stderr logger.
///
/// `RUST_LOG` wins when set; otherwise everything at `level` and above is
/// shown. Returns `false` if a global logger was already installed.
pub fn init(level: Level) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
