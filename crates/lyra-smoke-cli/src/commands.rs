//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use lyra_smoke::Position3;
use std::path::PathBuf;

/// lyra-smoke: smoke scenarios for a shipped game build
#[derive(Parser, Debug)]
#[command(name = "lyra-smoke")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve the view rotation that points an observer at a target
    Aim(AimArgs),

    /// Validate a scenario catalog and print the resolved steps
    Plan(PlanArgs),

    /// Dry-run scenarios against a scripted scene
    Run(RunArgs),

    /// Show the effective run configuration
    Config(ConfigArgs),
}

/// Arguments for the aim command
#[derive(Parser, Debug)]
pub struct AimArgs {
    /// Observer position as x,y,z
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub from: Position3,

    /// Target position as x,y,z
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub to: Position3,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: AimFormat,
}

/// Aim output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AimFormat {
    /// `pitch=.. yaw=.. roll=..`
    #[default]
    Text,
    /// JSON object
    Json,
}

/// Arguments for the plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Scenario catalog (YAML)
    pub catalog: PathBuf,

    /// Only these scenarios (repeatable); default is every runnable one
    #[arg(short, long)]
    pub scenario: Vec<String>,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Scenario catalog (YAML)
    pub catalog: PathBuf,

    /// Scripted scene standing in for the game (YAML)
    #[arg(long)]
    pub scene: PathBuf,

    /// Run configuration (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Only these scenarios (repeatable); default is every runnable one
    #[arg(short, long)]
    pub scenario: Vec<String>,

    /// Stop after the first failed scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// Write the JSON suite report here
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Run configuration (YAML); defaults otherwise
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Parse `x,y,z` into a position
pub fn parse_point(raw: &str) -> Result<Position3, String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected x,y,z but got '{raw}'"));
    };
    let component = |s: &str| {
        s.parse::<f64>()
            .map_err(|_| format!("'{s}' is not a number"))
    };
    Ok(Position3::new(component(x)?, component(y)?, component(z)?))
}
