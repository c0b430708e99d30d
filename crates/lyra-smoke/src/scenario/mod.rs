//! Declarative smoke scenarios.
//!
//! A [`Catalog`] is a YAML file of named locators and scenarios. Scenarios
//! compose through `extends`: a child runs its parent's steps first, then
//! its own. [`Catalog::resolve`] flattens and checks a scenario, and
//! [`ScenarioDriver`] executes it against an automation client.

pub mod compose;
pub mod driver;
pub mod schema;
pub mod state;
pub mod vars;

pub use compose::ResolvedScenario;
pub use driver::{
    ScenarioDriver, ScenarioReport, StepReport, StepStatus, YAW_CHANGE_TOLERANCE_DEG,
};
pub use schema::{
    AimTarget, ArgSpec, Catalog, CatalogError, ScenarioDef, Step, StepAction, CATALOG_VERSION,
};
pub use state::{check_phase_path, Phase, PhaseTracker};
pub use vars::{placeholders, Variables, MAX_INTERPOLATION_DEPTH};
