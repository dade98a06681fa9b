//! Subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `tfim_conv=debug`.
pub const LOG_ENV: &str = "TFIM_LOG";

/// Installs a stderr `fmt` subscriber filtered by `TFIM_LOG` (default
/// `info`). Stdout stays free for JSON results. Repeated calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
