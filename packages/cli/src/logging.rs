// ABOUTME: tracing subscriber setup for the CLI
// ABOUTME: Logs go to stderr so stdout only carries check results

use tplcheck_config::constants;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber once at startup. `verbose` raises the
/// default level to debug.
pub fn init(verbose: bool) {
    let default = if verbose {
        "debug"
    } else {
        constants::DEFAULT_LOG_FILTER
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(constants::RUST_LOG)
                .unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
