//! Log subscriber setup
//!
//! The repositories emit `tracing` events (operation entry and outcome at
//! `debug`, generated queries at `trace`). Applications that have no
//! subscriber of their own can install this one.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
///
/// Examples:
/// - `DOCREPO_LOG=trace` - show generated queries
/// - `DOCREPO_LOG=docrepo_db=debug` - repository operations only
/// - `DOCREPO_LOG=warn` - warnings and errors (the default)
pub const LOG_ENV: &str = "DOCREPO_LOG";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install a global fmt subscriber filtered by `DOCREPO_LOG`.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_level(true)
        .init();
}

/// Like `init_logging`, but returns `false` instead of panicking when a
/// subscriber is already installed.
pub fn try_init_logging() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_level(true)
        .try_init()
        .is_ok()
}
