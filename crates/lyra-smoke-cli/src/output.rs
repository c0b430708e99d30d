//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use lyra_smoke::{ScenarioReport, StepStatus};
use std::time::Duration;

/// Progress reporter for suite execution
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` scenarios
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    /// Print a line without interleaving with the bar
    fn line(&self, text: &str) {
        match self.progress_bar {
            // A hidden bar (stderr not a tty) drops println output
            Some(ref pb) if !pb.is_hidden() => pb.println(text),
            _ => {
                let _ = self.term.write_line(text);
            }
        }
    }

    fn prefix(&self, symbol: &str, plain: &str, paint: fn(&str) -> String) -> String {
        if self.use_color {
            paint(symbol)
        } else {
            plain.to_string()
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("✓", "PASS", |s| style(s).green().bold().to_string());
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        let prefix = self.prefix("✗", "FAIL", |s| style(s).red().bold().to_string());
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("⚠", "WARN", |s| style(s).yellow().bold().to_string());
        self.line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("ℹ", "INFO", |s| style(s).blue().bold().to_string());
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        self.line("");
        self.line(&styled);
    }

    /// One line per scenario, plus the failing step when it failed
    pub fn scenario(&self, report: &ScenarioReport) {
        let ran = report.steps.len() - report.count(StepStatus::Skipped);
        let summary = format!(
            "{} ({} steps, {}ms)",
            report.name, ran, report.duration_ms
        );
        if report.passed {
            self.success(&summary);
            return;
        }
        self.failure(&summary);
        if let Some(error) = &report.error {
            self.line(&format!("    {error}"));
        }
    }

    /// Suite tally. Shown in quiet mode only when something went wrong.
    pub fn summary(&self, passed: usize, failed: usize, not_run: usize, duration: Duration) {
        let clean = failed == 0 && not_run == 0;
        if self.quiet && clean {
            return;
        }

        let paint = |text: String, style: Style| {
            if self.use_color {
                style.apply_to(text).to_string()
            } else {
                text
            }
        };
        let verdict = if clean {
            paint("PASSED".into(), Style::new().green().bold())
        } else {
            paint("FAILED".into(), Style::new().red().bold())
        };
        let mut counts = vec![format!("{passed} passed")];
        if failed > 0 {
            counts.push(paint(format!("{failed} failed"), Style::new().red()));
        }
        if not_run > 0 {
            counts.push(paint(format!("{not_run} not run"), Style::new().yellow()));
        }

        self.line("");
        self.line(&format!(
            "{verdict} {} scenario(s) in {:.2}s: {}",
            passed + failed + not_run,
            duration.as_secs_f64(),
            counts.join(", ")
        ));
    }
}
