//! Config command handler

use crate::commands::ConfigArgs;
use crate::error::CliResult;
use lyra_smoke::SmokeConfig;

/// Load the file (or defaults), apply env overrides and render as YAML
pub fn execute_config(args: &ConfigArgs) -> CliResult<String> {
    let config = match &args.config {
        Some(path) => SmokeConfig::from_path(path)?,
        None => SmokeConfig::default(),
    };
    Ok(config.apply_env()?.to_yaml()?)
}
