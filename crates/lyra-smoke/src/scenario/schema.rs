//! YAML scenario catalog schema.
//!
//! ```yaml
//! version: "1.0"
//! name: lyra
//! locators:
//!   main_menu: "//*[contains(@name, 'W_LyraFrontEnd_C')]"
//!   start_button: "${main_menu}//StartGameButton"
//! scenarios:
//!   - name: launch_main_menu
//!     steps:
//!       - name: main_menu_visible
//!         wait_for: { locator: "${main_menu}", message: "Main Menu is not visible" }
//!   - name: open_experience_selection
//!     extends: launch_main_menu
//!     steps:
//!       - name: press_start
//!         click: { locator: "${start_button}" }
//! ```

use super::state::Phase;
use crate::aim::DEFAULT_VIEW_ROTATION_METHOD;
use crate::client::{MethodArg, MouseButton};
use crate::geometry::Vector3;
use crate::result::{SmokeError, SmokeResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Catalog format version this crate reads
pub const CATALOG_VERSION: &str = "1.0";

/// A named set of scenarios plus shared locators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Format version, must be "1.0"
    pub version: String,
    /// Catalog name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Named locator templates usable as `${name}`
    #[serde(default)]
    pub locators: BTreeMap<String, String>,
    /// Scenarios in declaration order
    pub scenarios: Vec<ScenarioDef>,
}

/// One scenario as written in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDef {
    /// Unique scenario name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Parent scenario whose steps run first
    #[serde(default)]
    pub extends: Option<String>,
    /// Building block only; never run on its own
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    /// Steps added after the parent's
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A named unit of work in a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Step name, used in reports and errors
    pub name: String,
    /// Skip without executing
    #[serde(default)]
    pub skip: bool,
    /// Extra attempts after a failure
    #[serde(default)]
    pub retries: u32,
    /// Phase to enter once the step passed
    #[serde(default)]
    pub enter: Option<Phase>,
    /// What the step does
    #[serde(flatten)]
    pub action: StepAction,
}

fn default_click_count() -> u32 {
    1
}

fn default_aim_method() -> String {
    DEFAULT_VIEW_ROTATION_METHOD.to_string()
}

/// Step payloads. Locator fields accept `${name}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    /// Wait until the object exists
    WaitFor {
        /// Object to wait for
        locator: String,
        /// Wait budget in seconds; the configured default when absent
        #[serde(default)]
        timeout_s: Option<f64>,
        /// Failure message when it never shows up
        #[serde(default)]
        message: Option<String>,
    },
    /// Hover the pointer over an object
    MovePointer {
        /// Object to hover
        locator: String,
        /// Button held in the move request
        #[serde(default)]
        button: MouseButton,
    },
    /// Click an object
    Click {
        /// Object to click
        locator: String,
        /// Button
        #[serde(default)]
        button: MouseButton,
        /// Click count
        #[serde(default = "default_click_count")]
        count: u32,
    },
    /// Invoke a remote method
    CallMethod {
        /// Target object
        locator: String,
        /// Method name
        method: String,
        /// Arguments
        #[serde(default)]
        args: Vec<ArgSpec>,
    },
    /// Read a field and store it
    CaptureField {
        /// Object to read
        locator: String,
        /// Field name
        field: String,
        /// Variable to store the value in
        into: String,
    },
    /// Read an object's position and store it
    CapturePosition {
        /// Object to read
        locator: String,
        /// Variable to store the position in
        into: String,
    },
    /// Read an object's rotation and store it
    CaptureRotation {
        /// Object to read
        locator: String,
        /// Variable to store the rotation in
        into: String,
    },
    /// Point the player's view at a target
    AimAt {
        /// Camera whose position is the observer
        camera: String,
        /// Player controller that receives the rotation
        controller: String,
        /// Controller method taking the rotation
        #[serde(default = "default_aim_method")]
        method: String,
        /// Where to look
        target: AimTarget,
    },
    /// Poll until the object is higher than a captured position
    ExpectPositionRise {
        /// Object to watch
        locator: String,
        /// Variable holding the baseline position
        baseline: String,
        /// Poll budget in seconds
        #[serde(default)]
        timeout_s: Option<f64>,
    },
    /// Poll until the object's yaw differs from a captured rotation
    ExpectYawChange {
        /// Object to watch
        locator: String,
        /// Variable holding the baseline rotation
        baseline: String,
        /// Poll budget in seconds
        #[serde(default)]
        timeout_s: Option<f64>,
    },
    /// Fixed delay. Prefer a wait or an expectation.
    Pause {
        /// Delay in milliseconds
        ms: u64,
    },
}

/// Aim target: an object's position plus an offset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AimTarget {
    /// Object whose position anchors the target
    pub from: String,
    /// Displacement from that position
    #[serde(default)]
    pub offset: Vector3,
}

/// Method argument: a literal or a captured variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgSpec {
    /// `{ var: name }`
    Var {
        /// Captured variable
        var: String,
    },
    /// `{ type: text, value: ... }`
    Literal(MethodArg),
}

impl StepAction {
    /// Snake-case action name
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::WaitFor { .. } => "wait_for",
            Self::MovePointer { .. } => "move_pointer",
            Self::Click { .. } => "click",
            Self::CallMethod { .. } => "call_method",
            Self::CaptureField { .. } => "capture_field",
            Self::CapturePosition { .. } => "capture_position",
            Self::CaptureRotation { .. } => "capture_rotation",
            Self::AimAt { .. } => "aim_at",
            Self::ExpectPositionRise { .. } => "expect_position_rise",
            Self::ExpectYawChange { .. } => "expect_yaw_change",
            Self::Pause { .. } => "pause",
        }
    }

    /// Locator templates this action reads
    #[must_use]
    pub fn locator_templates(&self) -> Vec<&str> {
        match self {
            Self::WaitFor { locator, .. }
            | Self::MovePointer { locator, .. }
            | Self::Click { locator, .. }
            | Self::CallMethod { locator, .. }
            | Self::CaptureField { locator, .. }
            | Self::CapturePosition { locator, .. }
            | Self::CaptureRotation { locator, .. }
            | Self::ExpectPositionRise { locator, .. }
            | Self::ExpectYawChange { locator, .. } => vec![locator.as_str()],
            Self::AimAt {
                camera,
                controller,
                target,
                ..
            } => vec![camera.as_str(), controller.as_str(), target.from.as_str()],
            Self::Pause { .. } => Vec::new(),
        }
    }

    /// Variables this action reads besides locator placeholders
    #[must_use]
    pub fn variable_reads(&self) -> Vec<&str> {
        match self {
            Self::CallMethod { args, .. } => args
                .iter()
                .filter_map(|arg| match arg {
                    ArgSpec::Var { var } => Some(var.as_str()),
                    ArgSpec::Literal(_) => None,
                })
                .collect(),
            Self::ExpectPositionRise { baseline, .. } | Self::ExpectYawChange { baseline, .. } => {
                vec![baseline.as_str()]
            }
            _ => Vec::new(),
        }
    }

    /// Variable this action writes
    #[must_use]
    pub fn captures(&self) -> Option<&str> {
        match self {
            Self::CaptureField { into, .. }
            | Self::CapturePosition { into, .. }
            | Self::CaptureRotation { into, .. } => Some(into.as_str()),
            _ => None,
        }
    }

    /// One-line human summary
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::WaitFor {
                locator, timeout_s, ..
            } => match timeout_s {
                Some(t) => format!("wait for {locator} (up to {t}s)"),
                None => format!("wait for {locator}"),
            },
            Self::MovePointer { locator, .. } => format!("hover {locator}"),
            Self::Click {
                locator,
                button,
                count,
            } => format!("{button} click x{count} on {locator}"),
            Self::CallMethod {
                locator,
                method,
                args,
            } => format!("call {method}({} args) on {locator}", args.len()),
            Self::CaptureField {
                locator,
                field,
                into,
            } => format!("{into} = {locator}.{field}"),
            Self::CapturePosition { locator, into } => format!("{into} = position of {locator}"),
            Self::CaptureRotation { locator, into } => format!("{into} = rotation of {locator}"),
            Self::AimAt {
                camera,
                method,
                target,
                ..
            } => format!(
                "aim {camera} at {} + {} via {method}",
                target.from, target.offset
            ),
            Self::ExpectPositionRise {
                locator, baseline, ..
            } => format!("expect {locator} above {baseline}"),
            Self::ExpectYawChange {
                locator, baseline, ..
            } => format!("expect {locator} yaw != {baseline}"),
            Self::Pause { ms } => format!("pause {ms}ms"),
        }
    }
}

/// Catalog loading and validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// YAML did not match the schema
    #[error("Failed to parse catalog: {0}")]
    ParseError(String),

    /// Unsupported version
    #[error("Invalid catalog version '{0}', expected '1.0'")]
    InvalidVersion(String),

    /// No scenarios at all
    #[error("Catalog has no scenarios")]
    EmptyScenarios,

    /// Two scenarios share a name
    #[error("Duplicate scenario name '{0}'")]
    DuplicateScenario(String),

    /// Two steps of one resolved scenario share a name
    #[error("Scenario '{scenario}' has duplicate step name '{step}'")]
    DuplicateStep {
        /// Scenario
        scenario: String,
        /// Step
        step: String,
    },

    /// `extends` names a scenario that does not exist
    #[error("Scenario '{scenario}' extends unknown scenario '{parent}'")]
    UnknownParent {
        /// Child
        scenario: String,
        /// Missing parent
        parent: String,
    },

    /// `extends` chain loops
    #[error("Scenario inheritance cycle: {}", .0.join(" -> "))]
    InheritanceCycle(Vec<String>),

    /// Lookup of a scenario that is not in the catalog
    #[error("Unknown scenario '{0}'")]
    UnknownScenario(String),

    /// Locator or variable reference that cannot be resolved
    #[error("Scenario '{scenario}' step '{step}': {message}")]
    InvalidReference {
        /// Scenario
        scenario: String,
        /// Step
        step: String,
        /// What is wrong
        message: String,
    },

    /// Illegal `enter` sequence
    #[error("Scenario '{scenario}': {message}")]
    InvalidPhase {
        /// Scenario
        scenario: String,
        /// What is wrong
        message: String,
    },
}

impl From<CatalogError> for SmokeError {
    fn from(err: CatalogError) -> Self {
        Self::scenario(err.to_string())
    }
}

impl Catalog {
    /// Parse and validate a catalog.
    ///
    /// # Errors
    ///
    /// Schema or structural problems; `extends` chains are checked when
    /// scenarios are resolved.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let catalog: Self =
            serde_yaml_ng::from_str(yaml).map_err(|e| CatalogError::ParseError(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Read, parse and validate a catalog file.
    ///
    /// # Errors
    ///
    /// I/O failures and everything [`Catalog::from_yaml`] rejects.
    pub fn from_path(path: impl AsRef<Path>) -> SmokeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_yaml(&text)?)
    }

    /// Scenario definition by name
    #[must_use]
    pub fn scenario(&self, name: &str) -> Option<&ScenarioDef> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.version != CATALOG_VERSION {
            return Err(CatalogError::InvalidVersion(self.version.clone()));
        }
        if self.scenarios.is_empty() {
            return Err(CatalogError::EmptyScenarios);
        }

        let mut names = HashSet::new();
        for scenario in &self.scenarios {
            if !names.insert(scenario.name.as_str()) {
                return Err(CatalogError::DuplicateScenario(scenario.name.clone()));
            }
        }

        for scenario in &self.scenarios {
            if let Some(parent) = &scenario.extends {
                if !names.contains(parent.as_str()) {
                    return Err(CatalogError::UnknownParent {
                        scenario: scenario.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
