//! Lyra Smoke: fixture-driven smoke scenarios for a shipped game build
//!
//! A remote automation client locates widgets and actors by path-like
//! queries, waits for them, and drives basic player actions. Scenarios are
//! YAML data; this crate resolves, runs and reports them.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐    ┌──────────────┐    ┌──────────────────┐
//! │ Catalog    │    │ Scenario     │    │ AutomationClient │
//! │ (YAML)     │───►│ Driver       │───►│ (remote / mock)  │
//! └────────────┘    └──────┬───────┘    └──────────────────┘
//!                          │ aim_at
//!                   ┌──────▼───────┐
//!                   │ Aim Solver   │
//!                   └──────────────┘
//! ```
//!
//! [`SmokeHarness`] owns the run: it opens one [`Session`] (fixtures first,
//! then the connection), drives every scenario, and always tears down.

#![warn(missing_docs)]

mod aim;
mod client;
mod config;
mod fixture;
mod geometry;
mod harness;
mod locator;
mod process;
mod result;
mod session;
mod wait;

pub mod mock;
pub mod scenario;

pub use aim::{aim_at, aim_rotation, DEFAULT_VIEW_ROTATION_METHOD};
pub use client::{AutomationClient, Connect, FieldValue, MethodArg, MouseButton, ObjectRef};
pub use config::{PollConfig, SmokeConfig, ENV_HOST, ENV_TIMEOUT_S};
pub use fixture::{Fixture, FixtureManager, FixtureScope, FixtureState, SimpleFixture};
pub use geometry::{EulerRotation3, Position3, Vector3};
pub use harness::{SmokeHarness, SuiteReport};
pub use locator::Locator;
pub use process::{AppProcess, ChildProcess, ProcessFixture};
pub use result::{SmokeError, SmokeResult};
pub use scenario::{
    Catalog, CatalogError, Phase, ResolvedScenario, ScenarioDriver, ScenarioReport, StepReport,
    StepStatus,
};
pub use session::Session;
pub use wait::{
    wait_timeout, wait_until, PollSchedule, WaitOptions, WaitResult, Waiter,
    DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_POLL_INTERVAL_MS, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_WAIT_TIMEOUT_MS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::client::*;
    pub use super::fixture::*;
    pub use super::geometry::*;
    pub use super::harness::*;
    pub use super::locator::*;
    pub use super::result::*;
    pub use super::scenario::{Catalog, Phase, ScenarioDriver, ScenarioReport};
    pub use super::session::*;
    pub use super::wait::*;
    pub use super::{aim_at, aim_rotation};
}
