//! Log subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise the `-v`/`-q` flags pick the level.
//! Logs go to stderr so stdout stays machine-readable.

use crate::config::CliConfig;
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG`, falling back to the verbosity's directive
#[must_use]
pub fn env_filter(config: &CliConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_directive()))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_tracing(config: &CliConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(std::io::stderr)
        .with_target(false);

    // Err only when a subscriber is already installed
    let _ = if config.log_json {
        builder.json().try_init()
    } else {
        builder
            .with_ansi(config.color.should_color())
            .compact()
            .try_init()
    };
}
