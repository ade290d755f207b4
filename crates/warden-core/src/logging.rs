//! Tracing setup
//!
//! Diagnostics go to stderr: stdout belongs to the aggregate response JSON
//! the host parses. `RUST_LOG` overrides the level derived from the global
//! config's `verbose_logging`.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
