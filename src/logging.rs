//! Diagnostic logging for the plugins
//!
//! Stdout belongs to the plugin protocol (one status line, optional verbose
//! echo), so everything logged here goes to stderr.

use std::io;

use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// `RUST_LOG` wins when set, otherwise only warnings are shown unless the
/// plugin was run with `--verbose`.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
    if let Err(e) = installed {
        debug!("keeping the existing subscriber: {}", e);
    }
}
