//! Tracing subscriber installation
//!
//! Log lines go to stderr as JSON; stdout carries command output only.

use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable overriding the configured filter
pub const LOG_ENV: &str = "AVROGATE_LOG";

/// Builds the filter from `AVROGATE_LOG`, falling back to `default_filter`
/// and then to `warn` when either directive string is unparsable.
pub fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Installs the global JSON subscriber.
///
/// Returns false if a subscriber was already installed.
pub fn init_tracing(default_filter: &str) -> bool {
    fmt()
        .json()
        .with_env_filter(env_filter(default_filter))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
