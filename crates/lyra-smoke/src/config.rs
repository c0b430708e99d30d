//! Run configuration.
//!
//! ```yaml
//! host: localhost
//! default_timeout_s: 30
//! poll:
//!   initial_interval_ms: 50
//!   backoff_factor: 1.5
//!   max_interval_ms: 1000
//! app_process: LyraGame
//! fail_fast: false
//! report_path: target/lyra-smoke/report.json
//! ```
//!
//! Every key is optional. `LYRA_SMOKE_HOST` and `LYRA_SMOKE_TIMEOUT_S`
//! override the file when [`SmokeConfig::apply_env`] is called.

use crate::result::{SmokeError, SmokeResult};
use crate::wait::WaitOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding [`SmokeConfig::host`]
pub const ENV_HOST: &str = "LYRA_SMOKE_HOST";
/// Environment variable overriding [`SmokeConfig::default_timeout_s`]
pub const ENV_TIMEOUT_S: &str = "LYRA_SMOKE_TIMEOUT_S";

/// Polling backoff settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// First sleep between checks
    pub initial_interval_ms: u64,
    /// Growth factor per check
    pub backoff_factor: f64,
    /// Ceiling for the sleep
    pub max_interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: 50,
            backoff_factor: 1.5,
            max_interval_ms: 1000,
        }
    }
}

/// Smoke run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmokeConfig {
    /// Automation server host
    pub host: String,
    /// Wait budget for steps without their own timeout
    pub default_timeout_s: f64,
    /// Polling backoff
    pub poll: PollConfig,
    /// Name of the game process a [`ProcessFixture`](crate::ProcessFixture)
    /// watches and terminates. The CLI dry run backs it with a simulated
    /// process; a live run registers its own [`AppProcess`](crate::AppProcess).
    pub app_process: Option<String>,
    /// Stop after the first failed scenario
    pub fail_fast: bool,
    /// Where to write the JSON suite report
    pub report_path: Option<PathBuf>,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            default_timeout_s: 30.0,
            poll: PollConfig::default(),
            app_process: None,
            fail_fast: false,
            report_path: None,
        }
    }
}

impl SmokeConfig {
    /// Defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the default wait budget
    #[must_use]
    pub const fn with_default_timeout_s(mut self, seconds: f64) -> Self {
        self.default_timeout_s = seconds;
        self
    }

    /// Set polling backoff
    #[must_use]
    pub const fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Set the watched process name
    #[must_use]
    pub fn with_app_process(mut self, name: impl Into<String>) -> Self {
        self.app_process = Some(name.into());
        self
    }

    /// Set fail-fast
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set the report path
    #[must_use]
    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    /// Parse and validate YAML.
    ///
    /// # Errors
    ///
    /// `Yaml` for malformed input, `InvalidInput` for bad values.
    pub fn from_yaml_str(yaml: &str) -> SmokeResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file.
    ///
    /// # Errors
    ///
    /// I/O errors plus everything [`Self::from_yaml_str`] rejects.
    pub fn from_path(path: impl AsRef<Path>) -> SmokeResult<Self> {
        Self::from_yaml_str(&std::fs::read_to_string(path)?)
    }

    /// Apply `LYRA_SMOKE_*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when an override does not parse.
    pub fn apply_env(self) -> SmokeResult<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup` (environment-shaped).
    ///
    /// # Errors
    ///
    /// `InvalidInput` when an override does not parse.
    pub fn apply_overrides<F>(mut self, lookup: F) -> SmokeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            self.host = host;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_S) {
            self.default_timeout_s = raw.trim().parse().map_err(|_| {
                SmokeError::invalid_input(format!("{ENV_TIMEOUT_S}='{raw}' is not a number"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// `InvalidInput` naming the first bad key.
    pub fn validate(&self) -> SmokeResult<()> {
        if self.host.trim().is_empty() {
            return Err(SmokeError::invalid_input("host must not be empty"));
        }
        if !self.default_timeout_s.is_finite() || self.default_timeout_s < 0.0 {
            return Err(SmokeError::invalid_input(format!(
                "default_timeout_s must be a non-negative number, got {}",
                self.default_timeout_s
            )));
        }
        if !self.poll.backoff_factor.is_finite() || self.poll.backoff_factor < 1.0 {
            return Err(SmokeError::invalid_input(format!(
                "poll.backoff_factor must be at least 1, got {}",
                self.poll.backoff_factor
            )));
        }
        if self.poll.initial_interval_ms == 0 {
            return Err(SmokeError::invalid_input(
                "poll.initial_interval_ms must be positive",
            ));
        }
        Ok(())
    }

    /// Wait options derived from this configuration.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the timeout is not representable.
    pub fn wait_options(&self) -> SmokeResult<WaitOptions> {
        let timeout = Duration::try_from_secs_f64(self.default_timeout_s).map_err(|_| {
            SmokeError::invalid_input(format!("invalid timeout {}s", self.default_timeout_s))
        })?;
        Ok(WaitOptions::new()
            .with_timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))
            .with_poll_interval(self.poll.initial_interval_ms)
            .with_backoff(self.poll.backoff_factor)
            .with_max_poll_interval(self.poll.max_interval_ms))
    }

    /// YAML rendering.
    ///
    /// # Errors
    ///
    /// Serialization failures.
    pub fn to_yaml(&self) -> SmokeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    mod loading {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = SmokeConfig::default();
            assert_eq!(config.host, "localhost");
            assert_eq!(config.default_timeout_s, 30.0);
            assert_eq!(config.poll.initial_interval_ms, 50);
            assert!(!config.fail_fast);
            assert!(config.app_process.is_none());
        }

        #[test]
        fn test_empty_yaml_is_defaults() {
            assert_eq!(SmokeConfig::from_yaml_str("{}").unwrap(), SmokeConfig::default());
        }

        #[test]
        fn test_partial_yaml_keeps_other_defaults() {
            let config = SmokeConfig::from_yaml_str(
                "host: rig-07\npoll:\n  backoff_factor: 2.0\napp_process: LyraGame\n",
            )
            .unwrap();
            assert_eq!(config.host, "rig-07");
            assert_eq!(config.poll.backoff_factor, 2.0);
            assert_eq!(config.poll.max_interval_ms, 1000);
            assert_eq!(config.app_process.as_deref(), Some("LyraGame"));
        }

        #[test]
        fn test_from_path() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "fail_fast: true\nreport_path: out/report.json").unwrap();
            let config = SmokeConfig::from_path(file.path()).unwrap();
            assert!(config.fail_fast);
            assert_eq!(config.report_path, Some(PathBuf::from("out/report.json")));
        }

        #[test]
        fn test_malformed_yaml() {
            assert!(matches!(
                SmokeConfig::from_yaml_str("poll: [1, 2"),
                Err(SmokeError::Yaml(_))
            ));
        }

        #[test]
        fn test_yaml_output_reloads() {
            let config = SmokeConfig::new().with_host("rig").with_fail_fast(true);
            let yaml = config.to_yaml().unwrap();
            assert_eq!(SmokeConfig::from_yaml_str(&yaml).unwrap(), config);
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn test_negative_timeout_rejected() {
            let err = SmokeConfig::from_yaml_str("default_timeout_s: -2").unwrap_err();
            assert!(err.to_string().contains("default_timeout_s"));
        }

        #[test]
        fn test_shrinking_backoff_rejected() {
            assert!(SmokeConfig::from_yaml_str("poll: { backoff_factor: 0.5 }").is_err());
        }

        #[test]
        fn test_blank_host_rejected() {
            assert!(SmokeConfig::new().with_host("  ").validate().is_err());
        }
    }

    mod overrides {
        use super::*;

        fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
            let map: HashMap<String, String> = pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect();
            move |key| map.get(key).cloned()
        }

        #[test]
        fn test_env_wins_over_file() {
            let config = SmokeConfig::new()
                .with_host("file-host")
                .apply_overrides(env(&[(ENV_HOST, "env-host"), (ENV_TIMEOUT_S, "12.5")]))
                .unwrap();
            assert_eq!(config.host, "env-host");
            assert_eq!(config.default_timeout_s, 12.5);
        }

        #[test]
        fn test_absent_env_changes_nothing() {
            let config = SmokeConfig::new().apply_overrides(env(&[])).unwrap();
            assert_eq!(config, SmokeConfig::default());
        }

        #[test]
        fn test_unparsable_timeout() {
            let err = SmokeConfig::new()
                .apply_overrides(env(&[(ENV_TIMEOUT_S, "soon")]))
                .unwrap_err();
            assert!(err.to_string().contains(ENV_TIMEOUT_S));
        }
    }

    #[test]
    fn test_wait_options_follow_config() {
        let options = SmokeConfig::new()
            .with_default_timeout_s(2.5)
            .with_poll(PollConfig {
                initial_interval_ms: 10,
                backoff_factor: 2.0,
                max_interval_ms: 80,
            })
            .wait_options()
            .unwrap();
        assert_eq!(options.timeout_ms, 2500);
        assert_eq!(options.poll_interval_ms, 10);
        assert_eq!(options.backoff_factor, 2.0);
        assert_eq!(options.max_poll_interval_ms, 80);
    }
}
