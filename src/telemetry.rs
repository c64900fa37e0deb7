//! Tracing subscriber installation.

use std::env;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

/// Variable holding the board's log filter directive.
pub const LOG_ENV: &str = "BOARD_LOG";

const FALLBACK_LOG_ENV: &str = "RUST_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

/// Errors returned while installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive does not parse.
    #[error("invalid log filter directive '{directive}': {source}")]
    InvalidFilter {
        /// Rejected directive.
        directive: String,
        /// Parse failure.
        source: ParseError,
    },

    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(Box<dyn std::error::Error + Send + Sync>),
}

/// Builds the log filter from `BOARD_LOG`, then `RUST_LOG`, then `info`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] when the chosen directive does
/// not parse.
pub fn env_filter<F>(lookup: F) -> Result<EnvFilter, TelemetryError>
where
    F: Fn(&str) -> Option<String>,
{
    let directive = lookup(LOG_ENV)
        .or_else(|| lookup(FALLBACK_LOG_ENV))
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_owned());
    EnvFilter::try_new(&directive)
        .map_err(|source| TelemetryError::InvalidFilter { directive, source })
}

/// Installs a formatted tracing subscriber filtered from the environment.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or a global
/// subscriber already exists.
pub fn init_tracing() -> Result<(), TelemetryError> {
    let filter = env_filter(|key| env::var(key).ok())?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(TelemetryError::Install)
}
