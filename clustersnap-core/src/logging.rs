//! Shared logging setup for clustersnap binaries.

use crate::{Result, error::GatherError};
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

/// Maps CLI verbosity flags to a tracing level.
///
/// `quiet` wins over any verbosity; otherwise 0 is INFO, 1 is DEBUG and
/// anything higher is TRACE.
pub fn level_for(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Installs the global log subscriber for a clustersnap binary.
///
/// The level comes from the `-v`/`-q` flags (see [`level_for`]); directives
/// in `RUST_LOG` take precedence, e.g. `RUST_LOG=clustersnap_core::gatherers=trace`.
/// Logs go to stderr so stdout stays free for command output such as the
/// gatherer list.
///
/// # Errors
/// Returns a configuration error when a subscriber is already installed.
///
/// # Example
/// ```rust,no_run
/// use clustersnap_core::init_logging;
///
/// // -vv on the command line
/// init_logging(2, false)?;
/// tracing::debug!("Starting gatherer clusterconfig/infrastructure");
/// # Ok::<(), clustersnap_core::GatherError>(())
/// ```
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, quiet))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| GatherError::configuration(format!("Failed to initialize logging: {e}")))
}

fn log_filter(verbose: u8, quiet: bool) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level_for(verbose, quiet)).into())
        .from_env_lossy()
}
