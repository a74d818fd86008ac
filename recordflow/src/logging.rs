//! Logging setup.
//!
//! Diagnostics go through `tracing` and are written to stderr, so stdout stays
//! reserved for command output. `RUST_LOG`, when set, takes precedence over the
//! configured level.

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::error::{AppError, AppResult};

/// Level names accepted by `--log-level` and `logging.level`.
pub const LEVEL_NAMES: &[&str] = &["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

/// Map a configured level name onto a tracing level.
///
/// `CRITICAL` has no tracing counterpart and maps to `ERROR`.
pub fn parse_level(name: &str) -> AppResult<Level> {
    match name.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARNING" | "WARN" => Ok(Level::WARN),
        "ERROR" | "CRITICAL" => Ok(Level::ERROR),
        other => Err(AppError::Configuration(format!(
            "Unknown log level '{}', expected one of {}",
            other,
            LEVEL_NAMES.join(", ")
        ))),
    }
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
