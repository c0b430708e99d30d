//! lyra-smoke CLI library
//!
//! Argument parsing, handlers and terminal output for the `lyra-smoke`
//! binary. Handlers return strings or reports so they can be tested without
//! spawning the binary.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod logging;
mod output;

pub use commands::{
    parse_point, AimArgs, AimFormat, Cli, ColorArg, Commands, ConfigArgs, PlanArgs, RunArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use logging::{env_filter, init_tracing};
pub use output::ProgressReporter;
