//! lyra-smoke: smoke scenarios for a shipped game build
//!
//! ## Usage
//!
//! ```bash
//! lyra-smoke aim --from 0,0,0 --to 500,500,-200
//! lyra-smoke plan demos/lyra_smoke.yaml
//! lyra-smoke run demos/lyra_smoke.yaml --scene demos/lyra_scene.yaml --report out/report.json
//! lyra-smoke config -c smoke.yaml
//! ```

use clap::Parser;
use lyra_smoke_cli::{
    handlers, init_tracing, Cli, CliConfig, CliResult, ColorChoice, Commands, ProgressReporter,
    Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(&config);

    match cli.command {
        Commands::Aim(args) => {
            println!("{}", handlers::execute_aim(&args)?);
            Ok(())
        }
        Commands::Plan(args) => {
            let (catalog, scenarios) = handlers::load_plan(&args)?;
            print!("{}", handlers::render_plan(&catalog, &scenarios));
            Ok(())
        }
        Commands::Run(args) => {
            let mut reporter = ProgressReporter::new(
                config.color.should_color(),
                config.verbosity.is_quiet(),
            );
            let report = handlers::execute_run(&args, &mut reporter)?;
            handlers::check_outcome(&report)
        }
        Commands::Config(args) => {
            print!("{}", handlers::execute_config(&args)?);
            Ok(())
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(ColorChoice::from(cli.color.clone()))
        .with_log_json(cli.log_json)
}
