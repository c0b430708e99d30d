//! Run command handler: dry-run scenarios against a scripted scene.
//!
//! The scene stands in for the game build. When the configuration names an
//! `app_process`, a simulated process fixture is registered so the run goes
//! through the same setup and teardown as a live session.

use super::plan::select;
use crate::commands::RunArgs;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use lyra_smoke::mock::{MockConnector, MockProcess, MockScene};
use lyra_smoke::scenario::Catalog;
use lyra_smoke::{FixtureManager, ProcessFixture, SmokeConfig, SmokeHarness, SuiteReport};
use std::time::Duration;
use tracing::info;

/// Effective configuration: file (or defaults), env overrides, then flags
pub fn resolve_config(args: &RunArgs) -> CliResult<SmokeConfig> {
    let config = match &args.config {
        Some(path) => SmokeConfig::from_path(path)?,
        None => SmokeConfig::default(),
    };
    let mut config = config.apply_env()?;
    if args.fail_fast {
        config.fail_fast = true;
    }
    if let Some(report) = &args.report {
        config.report_path = Some(report.clone());
    }
    Ok(config)
}

/// Run the selected scenarios and return the suite report.
///
/// Scenario failures are in the report, not in the error.
pub fn execute_run(args: &RunArgs, reporter: &mut ProgressReporter) -> CliResult<SuiteReport> {
    let config = resolve_config(args)?;
    let catalog = Catalog::from_path(&args.catalog)?;
    let scenarios = select(&catalog, &args.scenario)?;
    let scene = MockScene::from_path(&args.scene)?;
    info!(catalog = %catalog.name, scenarios = scenarios.len(), "dry run");

    let mut fixtures = FixtureManager::new();
    if let Some(name) = &config.app_process {
        fixtures.register(ProcessFixture::new(MockProcess::running(name.clone())));
    }

    reporter.header(&format!("{} (dry run)", catalog.name));
    reporter.start_progress(scenarios.len() as u64, "scenarios");
    let report = SmokeHarness::from_config(&config)?.run_suite_observed(
        &MockConnector::new(scene),
        fixtures,
        &catalog,
        &scenarios,
        |result| {
            reporter.scenario(result);
            reporter.increment(1);
        },
    );
    reporter.finish();
    let report = report?;

    if let Some(error) = &report.teardown_error {
        reporter.warning(&format!("teardown: {error}"));
    }
    reporter.summary(
        report.passed_count(),
        report.failed_count(),
        report.not_run.len(),
        Duration::from_millis(report.duration_ms),
    );
    if let Some(path) = &config.report_path {
        report.write_json(path)?;
        reporter.info(&format!("report written to {}", path.display()));
    }
    Ok(report)
}

/// Exit status for a finished suite
pub fn check_outcome(report: &SuiteReport) -> CliResult<()> {
    if report.all_passed() {
        return Ok(());
    }
    if let Some(error) = &report.teardown_error {
        if report.failed_count() == 0 {
            return Err(CliError::config(format!("teardown failed: {error}")));
        }
    }
    Err(CliError::ScenariosFailed {
        failed: report.failed_count() + report.not_run.len(),
        total: report.total() + report.not_run.len(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    const CATALOG: &str = r#"
version: "1.0"
name: mini
scenarios:
  - name: menu
    steps:
      - name: menu_visible
        wait_for: { locator: "//Menu", timeout_s: 0.05 }
  - name: hud
    steps:
      - name: hud_visible
        wait_for: { locator: "//HUD", timeout_s: 0.05 }
"#;

    const SCENE: &str = r#"
objects:
  - locator: "//Menu"
"#;

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    fn args(dir: &Path) -> RunArgs {
        RunArgs {
            catalog: write(dir, "catalog.yaml", CATALOG),
            scene: write(dir, "scene.yaml", SCENE),
            config: Some(write(
                dir,
                "config.yaml",
                "poll: { initial_interval_ms: 1, backoff_factor: 1.0 }\n",
            )),
            scenario: Vec::new(),
            fail_fast: false,
            report: None,
        }
    }

    #[test]
    fn test_run_reports_pass_and_fail() {
        let dir = tempfile::tempdir().unwrap();
        let mut reporter = ProgressReporter::new(false, true);
        let report = execute_run(&args(dir.path()), &mut reporter).unwrap();

        assert_eq!(report.passed_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert!(matches!(
            check_outcome(&report),
            Err(CliError::ScenariosFailed { failed: 1, total: 2 })
        ));
    }

    #[test]
    fn test_selected_scenario_passes_and_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut run_args = args(dir.path());
        run_args.scenario = vec!["menu".into()];
        run_args.report = Some(dir.path().join("out").join("report.json"));

        let mut reporter = ProgressReporter::new(false, true);
        let report = execute_run(&run_args, &mut reporter).unwrap();

        assert!(check_outcome(&report).is_ok());
        let written = std::fs::read_to_string(dir.path().join("out").join("report.json")).unwrap();
        assert!(written.contains("\"suite_name\": \"mini\""));
    }

    #[test]
    fn test_fail_fast_flag_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut run_args = args(dir.path());
        run_args.fail_fast = true;
        assert!(resolve_config(&run_args).unwrap().fail_fast);
    }

    #[test]
    fn test_missing_scene_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut run_args = args(dir.path());
        run_args.scene = dir.path().join("missing.yaml");
        let mut reporter = ProgressReporter::new(false, true);
        assert!(execute_run(&run_args, &mut reporter).is_err());
    }
}
