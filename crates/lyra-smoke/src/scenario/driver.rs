//! Scenario execution.
//!
//! Steps run strictly in order against one [`AutomationClient`]. The first
//! failing step moves the scenario to [`Phase::Failed`] and nothing after it
//! runs. `NotFound` reads surface as precondition failures of the step that
//! made them.

use super::compose::ResolvedScenario;
use super::schema::{ArgSpec, Catalog, Step, StepAction};
use super::state::{Phase, PhaseTracker};
use super::vars::Variables;
use crate::aim::aim_at;
use crate::client::{AutomationClient, FieldValue, MethodArg};
use crate::result::{SmokeError, SmokeResult};
use crate::wait::{wait_timeout, WaitOptions, Waiter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Smallest yaw difference (degrees) that counts as a change
pub const YAW_CHANGE_TOLERANCE_DEG: f64 = 1e-3;

// =============================================================================
// REPORTS
// =============================================================================

/// Outcome of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Ran and succeeded
    Passed,
    /// Ran and failed
    Failed,
    /// Marked `skip`
    Skipped,
}

/// Per-step record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// Step name
    pub name: String,
    /// Action kind, e.g. `wait_for`
    pub action: String,
    /// Outcome
    pub status: StepStatus,
    /// Attempts made (0 when skipped)
    pub attempts: u32,
    /// Wall time in milliseconds
    pub duration_ms: u64,
    /// Failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepReport {
    fn skipped(step: &Step) -> Self {
        Self {
            name: step.name.clone(),
            action: step.action.kind().to_string(),
            status: StepStatus::Skipped,
            attempts: 0,
            duration_ms: 0,
            error: None,
        }
    }
}

/// Record of one scenario run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario name
    pub name: String,
    /// Whether every executed step passed
    pub passed: bool,
    /// Phase when the run ended
    pub phase: Phase,
    /// Executed and skipped steps, in order
    pub steps: Vec<StepReport>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
    /// Failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failure ended the whole run (connection lost)
    #[serde(default)]
    pub fatal: bool,
}

impl ScenarioReport {
    /// Report for a scenario that never ran
    #[must_use]
    pub fn not_run(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            phase: Phase::NotStarted,
            steps: Vec::new(),
            duration_ms: 0,
            error: Some(reason.into()),
            fatal: false,
        }
    }

    /// First failed step, if any
    #[must_use]
    pub fn failed_step(&self) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.status == StepStatus::Failed)
    }

    /// Count of steps with `status`
    #[must_use]
    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// =============================================================================
// DRIVER
// =============================================================================

/// Runs resolved scenarios against a client
#[derive(Debug, Clone)]
pub struct ScenarioDriver<'a> {
    locators: &'a BTreeMap<String, String>,
    wait: WaitOptions,
}

impl<'a> ScenarioDriver<'a> {
    /// Driver using `catalog`'s named locators and default wait options
    #[must_use]
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            locators: &catalog.locators,
            wait: WaitOptions::default(),
        }
    }

    /// Wait options used when a step names no timeout
    #[must_use]
    pub fn with_wait_options(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Run every step of `scenario` and report.
    ///
    /// Never fails as a whole; problems are recorded in the report. Check
    /// [`ScenarioReport::fatal`] to decide whether later scenarios may run.
    pub fn run<C: AutomationClient + ?Sized>(
        &self,
        client: &mut C,
        scenario: &ResolvedScenario,
    ) -> ScenarioReport {
        let start = Instant::now();
        info!(scenario = %scenario.name, steps = scenario.steps.len(), "scenario started");

        let mut phases = PhaseTracker::new();
        let mut steps = Vec::with_capacity(scenario.steps.len());
        let outcome = self
            .run_steps(client, scenario, &mut phases, &mut steps)
            .and_then(|()| phases.transition(Phase::Done));

        if outcome.is_err() {
            phases.fail();
        }
        let duration_ms = millis(start.elapsed());
        match &outcome {
            Ok(()) => info!(scenario = %scenario.name, duration_ms, "scenario passed"),
            Err(e) => warn!(scenario = %scenario.name, error = %e, "scenario failed"),
        }

        ScenarioReport {
            name: scenario.name.clone(),
            passed: outcome.is_ok(),
            phase: phases.current(),
            steps,
            duration_ms,
            fatal: outcome.as_ref().is_err_and(SmokeError::is_fatal_to_run),
            error: outcome.err().map(|e| e.to_string()),
        }
    }

    fn run_steps<C: AutomationClient + ?Sized>(
        &self,
        client: &mut C,
        scenario: &ResolvedScenario,
        phases: &mut PhaseTracker,
        reports: &mut Vec<StepReport>,
    ) -> SmokeResult<()> {
        phases.transition(Phase::WaitingForMenu)?;
        let mut vars = Variables::new();

        for step in &scenario.steps {
            if step.skip {
                debug!(step = %step.name, "step skipped");
                reports.push(StepReport::skipped(step));
                continue;
            }

            let started = Instant::now();
            let (attempts, result) = self.run_with_retries(client, step, &mut vars);
            let result = result
                .and_then(|()| step.enter.map_or(Ok(()), |phase| phases.transition(phase)))
                .map_err(|e| surface(step, e));

            reports.push(StepReport {
                name: step.name.clone(),
                action: step.action.kind().to_string(),
                status: if result.is_ok() {
                    StepStatus::Passed
                } else {
                    StepStatus::Failed
                },
                attempts,
                duration_ms: millis(started.elapsed()),
                error: result.as_ref().err().map(ToString::to_string),
            });
            result?;
        }
        Ok(())
    }

    fn run_with_retries<C: AutomationClient + ?Sized>(
        &self,
        client: &mut C,
        step: &Step,
        vars: &mut Variables,
    ) -> (u32, SmokeResult<()>) {
        let max_attempts = step.retries.saturating_add(1);
        let mut attempts = 0_u32;
        loop {
            attempts += 1;
            info!(step = %step.name, action = step.action.kind(), attempt = attempts, "step");
            match self.execute(client, step, vars) {
                Ok(()) => return (attempts, Ok(())),
                Err(e) if attempts < max_attempts && !e.is_fatal_to_run() => {
                    warn!(step = %step.name, error = %e, "step failed; retrying");
                }
                Err(e) => return (attempts, Err(e)),
            }
        }
    }

    fn wait_options(&self, timeout_s: Option<f64>) -> SmokeResult<WaitOptions> {
        let Some(secs) = timeout_s else {
            return Ok(self.wait.clone());
        };
        let timeout = Duration::try_from_secs_f64(secs)
            .map_err(|_| SmokeError::invalid_input(format!("invalid timeout {secs}s")))?;
        Ok(self.wait.clone().with_timeout(millis(timeout)))
    }

    fn execute<C: AutomationClient + ?Sized>(
        &self,
        client: &mut C,
        step: &Step,
        vars: &mut Variables,
    ) -> SmokeResult<()> {
        let locate = |template: &str, vars: &Variables| vars.interpolate(template, self.locators);

        match &step.action {
            StepAction::WaitFor {
                locator,
                timeout_s,
                message,
            } => {
                let locator = locate(locator, vars)?;
                let options = self.wait_options(*timeout_s)?;
                if client.wait_for_object(&locator, &options)? {
                    Ok(())
                } else {
                    let message = message.clone().unwrap_or_else(|| {
                        format!("'{locator}' did not appear within {}ms", options.timeout_ms)
                    });
                    Err(SmokeError::precondition(&step.name, message))
                }
            }
            StepAction::MovePointer { locator, button } => {
                client.mouse_move_to_object(&locate(locator, vars)?, *button)
            }
            StepAction::Click {
                locator,
                button,
                count,
            } => client.click_object(*button, &locate(locator, vars)?, *count),
            StepAction::CallMethod {
                locator,
                method,
                args,
            } => {
                let locator = locate(locator, vars)?;
                let args = args
                    .iter()
                    .map(|arg| match arg {
                        ArgSpec::Var { var } => vars.method_arg(var),
                        ArgSpec::Literal(value) => Ok(value.clone()),
                    })
                    .collect::<SmokeResult<Vec<MethodArg>>>()?;
                client.call_method(&locator, method, &args)
            }
            StepAction::CaptureField {
                locator,
                field,
                into,
            } => {
                let locator = locate(locator, vars)?;
                let value = client
                    .field_value(&locator, field)?
                    .ok_or_else(|| SmokeError::field_not_found(locator.as_str(), field.as_str()))?;
                debug!(%locator, field, into, kind = value.kind(), "captured field");
                vars.insert(into.clone(), value);
                Ok(())
            }
            StepAction::CapturePosition { locator, into } => {
                let position = client.object_position(&locate(locator, vars)?)?;
                vars.insert(into.clone(), FieldValue::Position(position));
                Ok(())
            }
            StepAction::CaptureRotation { locator, into } => {
                let rotation = client.object_rotation(&locate(locator, vars)?)?;
                vars.insert(into.clone(), FieldValue::Rotation(rotation));
                Ok(())
            }
            StepAction::AimAt {
                camera,
                controller,
                method,
                target,
            } => {
                let camera = locate(camera, vars)?;
                let controller = locate(controller, vars)?;
                let anchor = client.object_position(&locate(&target.from, vars)?)?;
                let rotation = aim_at(client, &camera, &controller, method, anchor + target.offset)?;
                info!(step = %step.name, %rotation, "view rotation applied");
                Ok(())
            }
            StepAction::ExpectPositionRise {
                locator,
                baseline,
                timeout_s,
            } => {
                let locator = locate(locator, vars)?;
                let floor = vars.position(baseline)?.z;
                let options = self.wait_options(*timeout_s)?;
                let waited = Waiter::with_options(options.clone()).poll_until(
                    &format!("{locator} above z={floor:.3}"),
                    || Ok(client.object_position(&locator)?.z > floor),
                )?;
                if waited.success {
                    Ok(())
                } else {
                    Err(SmokeError::assertion(format!(
                        "'{locator}' did not rise above z={floor:.3} within {}ms",
                        options.timeout_ms
                    )))
                }
            }
            StepAction::ExpectYawChange {
                locator,
                baseline,
                timeout_s,
            } => {
                let locator = locate(locator, vars)?;
                let before = vars.rotation(baseline)?;
                let options = self.wait_options(*timeout_s)?;
                let waited = Waiter::with_options(options.clone()).poll_until(
                    &format!("{locator} yaw away from {:.3}", before.yaw),
                    || {
                        let now = client.object_rotation(&locator)?;
                        Ok(before.yaw_delta(&now) > YAW_CHANGE_TOLERANCE_DEG)
                    },
                )?;
                if waited.success {
                    Ok(())
                } else {
                    Err(SmokeError::assertion(format!(
                        "yaw of '{locator}' stayed at {:.3} for {}ms",
                        before.yaw, options.timeout_ms
                    )))
                }
            }
            StepAction::Pause { ms } => {
                debug!(step = %step.name, ms, "fixed pause");
                wait_timeout(*ms);
                Ok(())
            }
        }
    }
}

/// `NotFound` becomes a precondition failure of `step`; everything else
/// passes through.
fn surface(step: &Step, err: SmokeError) -> SmokeError {
    match err {
        SmokeError::NotFound { .. } => SmokeError::precondition(&step.name, err.to_string()),
        other => other,
    }
}
