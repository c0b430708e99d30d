//! Suite runner: one session, many scenarios, one report.

use crate::client::Connect;
use crate::config::SmokeConfig;
use crate::fixture::FixtureManager;
use crate::result::SmokeResult;
use crate::scenario::driver::millis;
use crate::scenario::{Catalog, ResolvedScenario, ScenarioDriver, ScenarioReport};
use crate::session::Session;
use crate::wait::WaitOptions;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Results from running a suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Catalog name
    pub suite_name: String,
    /// Unique id of this run
    pub run_id: Uuid,
    /// Wall-clock start
    pub started_at: DateTime<Utc>,
    /// Host the session connected to
    pub host: String,
    /// Total duration in milliseconds
    pub duration_ms: u64,
    /// Scenario results in run order
    pub results: Vec<ScenarioReport>,
    /// Scenarios never started because the run stopped early
    #[serde(default)]
    pub not_run: Vec<String>,
    /// The run stopped early (fail-fast or lost connection)
    #[serde(default)]
    pub aborted: bool,
    /// Session close problem, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teardown_error: Option<String>,
}

impl SuiteReport {
    /// Every scenario ran and passed, and cleanup succeeded
    #[must_use]
    pub fn all_passed(&self) -> bool {
        !self.aborted
            && self.teardown_error.is_none()
            && self.results.iter().all(|r| r.passed)
    }

    /// Count passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Count failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    /// Scenarios that ran
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Failed scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioReport> {
        self.results.iter().filter(|r| !r.passed).collect()
    }

    /// Pretty JSON.
    ///
    /// # Errors
    ///
    /// Serialization failures.
    pub fn to_json(&self) -> SmokeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write pretty JSON to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// I/O and serialization failures.
    pub fn write_json(&self, path: &Path) -> SmokeResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Runs resolved scenarios through one session
#[derive(Debug, Clone)]
pub struct SmokeHarness {
    /// Stop after the first failed scenario
    pub fail_fast: bool,
    /// Automation server host
    pub host: String,
    /// Wait options for steps without their own timeout
    pub wait: WaitOptions,
}

impl Default for SmokeHarness {
    fn default() -> Self {
        Self {
            fail_fast: false,
            host: "localhost".to_string(),
            wait: WaitOptions::default(),
        }
    }
}

impl SmokeHarness {
    /// Harness with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Harness configured from `config`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the configured timeout is unusable.
    pub fn from_config(config: &SmokeConfig) -> SmokeResult<Self> {
        Ok(Self {
            fail_fast: config.fail_fast,
            host: config.host.clone(),
            wait: config.wait_options()?,
        })
    }

    /// Enable or disable fail-fast
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set the host
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set default wait options
    #[must_use]
    pub fn with_wait_options(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Open a session, run `scenarios` in order, and always close it.
    ///
    /// A lost connection stops the run; with fail-fast so does any failed
    /// scenario. Either way the session is closed and fixtures torn down.
    ///
    /// # Errors
    ///
    /// Only when the session cannot be opened (fixture setup or connect).
    /// Scenario failures and close problems are recorded in the report.
    pub fn run_suite<K: Connect>(
        &self,
        connector: &K,
        fixtures: FixtureManager,
        catalog: &Catalog,
        scenarios: &[ResolvedScenario],
    ) -> SmokeResult<SuiteReport> {
        self.run_suite_observed(connector, fixtures, catalog, scenarios, |_| {})
    }

    /// [`Self::run_suite`], calling `on_result` after each scenario.
    ///
    /// # Errors
    ///
    /// Same as [`Self::run_suite`].
    pub fn run_suite_observed<K, F>(
        &self,
        connector: &K,
        fixtures: FixtureManager,
        catalog: &Catalog,
        scenarios: &[ResolvedScenario],
        mut on_result: F,
    ) -> SmokeResult<SuiteReport>
    where
        K: Connect,
        F: FnMut(&ScenarioReport),
    {
        let started_at = Utc::now();
        let start = Instant::now();
        let run_id = Uuid::new_v4();
        info!(suite = %catalog.name, %run_id, scenarios = scenarios.len(), "suite started");

        let mut session = Session::open(connector, &self.host, fixtures)?;
        let driver = ScenarioDriver::new(catalog).with_wait_options(self.wait.clone());

        let mut results = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            let report = driver.run(session.client()?, scenario);
            let stop = if report.fatal {
                warn!(scenario = %scenario.name, "connection lost; aborting run");
                true
            } else {
                self.fail_fast && !report.passed
            };
            on_result(&report);
            results.push(report);
            if stop {
                break;
            }
        }
        let not_run: Vec<String> = scenarios
            .iter()
            .skip(results.len())
            .map(|s| s.name.clone())
            .collect();

        let teardown_error = session.close().err().map(|e| {
            warn!(error = %e, "session close failed");
            e.to_string()
        });

        let report = SuiteReport {
            suite_name: catalog.name.clone(),
            run_id,
            started_at,
            host: self.host.clone(),
            duration_ms: millis(start.elapsed()),
            results,
            aborted: !not_run.is_empty(),
            not_run,
            teardown_error,
        };
        info!(
            suite = %report.suite_name,
            passed = report.passed_count(),
            failed = report.failed_count(),
            "suite finished"
        );
        Ok(report)
    }
}
