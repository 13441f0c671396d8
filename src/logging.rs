//! Logging setup for the dump-extract binary.
//!
//! Log output goes to stderr so extracted rows on stdout stay pipeable.

use tracing_subscriber::EnvFilter;

use crate::error::{ExtractError, Result};

/// Map `-v`/`-q` flags to a level (0=INFO, 1=DEBUG, 2+=TRACE, quiet=ERROR)
pub fn level_for(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Initialize the global subscriber. `RUST_LOG` overrides the flag-derived level.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = level_for(verbose, quiet);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| ExtractError::Logging {
            message: e.to_string(),
        })
}
