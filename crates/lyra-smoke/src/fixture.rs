//! Fixture Management
//!
//! Ordered setup and reverse-order teardown for the resources a smoke run
//! depends on (the external game process, scratch state). Teardown always
//! visits every fixture that was set up and reports the first failure.

use crate::result::{SmokeError, SmokeResult};
use tracing::{debug, warn};

/// A resource with explicit setup and teardown.
///
/// ```ignore
/// struct GameReady { process: ChildProcess }
///
/// impl Fixture for GameReady {
///     fn setup(&mut self) -> SmokeResult<()> { /* verify it is up */ Ok(()) }
///     fn teardown(&mut self) -> SmokeResult<()> { self.process.terminate() }
/// }
/// ```
pub trait Fixture: Send {
    /// Set up the fixture before scenarios run.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be made ready.
    fn setup(&mut self) -> SmokeResult<()>;

    /// Tear down the fixture after scenarios ran.
    ///
    /// # Errors
    ///
    /// Returns an error if cleanup fails.
    fn teardown(&mut self) -> SmokeResult<()>;

    /// Fixture name for logging.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Higher priority is set up first and torn down last.
    fn priority(&self) -> i32 {
        0
    }
}

/// Lifecycle state of a registered fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    /// Registered, not set up.
    Registered,
    /// Set up successfully.
    SetUp,
    /// Torn down.
    TornDown,
    /// Setup or teardown failed.
    Failed,
}

struct FixtureEntry {
    fixture: Box<dyn Fixture>,
    state: FixtureState,
}

/// Holds fixtures and runs their lifecycle in priority order.
#[derive(Default)]
pub struct FixtureManager {
    entries: Vec<FixtureEntry>,
    setup_order: Vec<usize>,
}

impl std::fmt::Debug for FixtureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureManager")
            .field("fixtures", &self.list())
            .field("set_up", &self.setup_order.len())
            .finish()
    }
}

impl FixtureManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fixture.
    pub fn register<F: Fixture + 'static>(&mut self, fixture: F) {
        self.register_boxed(Box::new(fixture));
    }

    /// Register an already boxed fixture.
    pub fn register_boxed(&mut self, fixture: Box<dyn Fixture>) {
        self.entries.push(FixtureEntry {
            fixture,
            state: FixtureState::Registered,
        });
    }

    /// Number of registered fixtures.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Registered fixture names in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.fixture.name()).collect()
    }

    /// State of the fixture called `name`.
    #[must_use]
    pub fn state(&self, name: &str) -> Option<FixtureState> {
        self.entries
            .iter()
            .find(|e| e.fixture.name() == name)
            .map(|e| e.state)
    }

    /// Set up every registered fixture, highest priority first. Ties keep
    /// registration order.
    ///
    /// # Errors
    ///
    /// Returns the first setup failure. Fixtures already set up are torn
    /// down again before returning.
    pub fn setup_all(&mut self) -> SmokeResult<()> {
        let mut ordered: Vec<usize> = (0..self.entries.len()).collect();
        ordered.sort_by_key(|&i| std::cmp::Reverse(self.entries[i].fixture.priority()));
        self.setup_order.clear();

        for index in ordered {
            let entry = &mut self.entries[index];
            if entry.state == FixtureState::SetUp {
                continue;
            }
            debug!(fixture = entry.fixture.name(), "setting up fixture");
            if let Err(e) = entry.fixture.setup() {
                entry.state = FixtureState::Failed;
                let err = in_fixture(entry.fixture.name(), "setup", &e);
                if let Err(rollback) = self.teardown_all() {
                    warn!(error = %rollback, "rollback after failed setup was incomplete");
                }
                return Err(err);
            }
            entry.state = FixtureState::SetUp;
            self.setup_order.push(index);
        }
        Ok(())
    }

    /// Tear down every set-up fixture in reverse setup order.
    ///
    /// # Errors
    ///
    /// All fixtures are visited; the first failure is returned.
    pub fn teardown_all(&mut self) -> SmokeResult<()> {
        let mut first_error: Option<SmokeError> = None;

        for index in self.setup_order.drain(..).rev() {
            let entry = &mut self.entries[index];
            if entry.state != FixtureState::SetUp {
                continue;
            }
            debug!(fixture = entry.fixture.name(), "tearing down fixture");
            match entry.fixture.teardown() {
                Ok(()) => entry.state = FixtureState::TornDown,
                Err(e) => {
                    warn!(fixture = entry.fixture.name(), error = %e, "teardown failed");
                    entry.state = FixtureState::Failed;
                    if first_error.is_none() {
                        first_error = Some(in_fixture(entry.fixture.name(), "teardown", &e));
                    }
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Whether any fixture is currently set up.
    #[must_use]
    pub fn has_active(&self) -> bool {
        !self.setup_order.is_empty()
    }
}

/// Name the fixture in `error`. A lost game process stays a connection
/// error so the run still aborts on it.
fn in_fixture(name: &str, stage: &str, error: &SmokeError) -> SmokeError {
    let message = format!("Fixture '{name}' {stage} failed: {error}");
    if error.is_fatal_to_run() {
        SmokeError::connection(message)
    } else {
        SmokeError::fixture(message)
    }
}

/// A fixture built from closures.
pub struct SimpleFixture {
    name: String,
    priority: i32,
    setup_fn: Option<Box<dyn FnMut() -> SmokeResult<()> + Send>>,
    teardown_fn: Option<Box<dyn FnMut() -> SmokeResult<()> + Send>>,
}

impl std::fmt::Debug for SimpleFixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleFixture")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

impl SimpleFixture {
    /// Create a named fixture with no-op hooks.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            setup_fn: None,
            teardown_fn: None,
        }
    }

    /// Set the setup hook.
    #[must_use]
    pub fn with_setup<F>(mut self, f: F) -> Self
    where
        F: FnMut() -> SmokeResult<()> + Send + 'static,
    {
        self.setup_fn = Some(Box::new(f));
        self
    }

    /// Set the teardown hook.
    #[must_use]
    pub fn with_teardown<F>(mut self, f: F) -> Self
    where
        F: FnMut() -> SmokeResult<()> + Send + 'static,
    {
        self.teardown_fn = Some(Box::new(f));
        self
    }

    /// Set the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl Fixture for SimpleFixture {
    fn setup(&mut self) -> SmokeResult<()> {
        self.setup_fn.as_mut().map_or(Ok(()), |f| f())
    }

    fn teardown(&mut self) -> SmokeResult<()> {
        self.teardown_fn.as_mut().map_or(Ok(()), |f| f())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// Owns a set-up [`FixtureManager`] and tears it down when dropped.
#[derive(Debug)]
pub struct FixtureScope {
    manager: FixtureManager,
}

impl FixtureScope {
    /// Set up every fixture in `manager` and wrap it.
    ///
    /// # Errors
    ///
    /// Propagates the setup failure; nothing is left set up in that case.
    pub fn enter(mut manager: FixtureManager) -> SmokeResult<Self> {
        manager.setup_all()?;
        Ok(Self { manager })
    }

    /// Tear down now instead of at drop. Calling it twice is a no-op.
    ///
    /// # Errors
    ///
    /// The first teardown failure.
    pub fn teardown(&mut self) -> SmokeResult<()> {
        self.manager.teardown_all()
    }

    /// The managed fixtures.
    #[must_use]
    pub const fn manager(&self) -> &FixtureManager {
        &self.manager
    }
}

impl Drop for FixtureScope {
    fn drop(&mut self) {
        if self.manager.has_active() {
            if let Err(e) = self.manager.teardown_all() {
                warn!(error = %e, "fixture teardown during drop failed");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    fn logging(name: &str, log: &Log) -> SimpleFixture {
        let (a, b) = (Arc::clone(log), Arc::clone(log));
        let (sn, tn) = (format!("setup:{name}"), format!("teardown:{name}"));
        SimpleFixture::new(name)
            .with_setup(move || {
                a.lock().unwrap().push(sn.clone());
                Ok(())
            })
            .with_teardown(move || {
                b.lock().unwrap().push(tn.clone());
                Ok(())
            })
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    mod ordering {
        use super::*;

        #[test]
        fn test_setup_by_priority_teardown_reversed() {
            let log = Log::default();
            let mut manager = FixtureManager::new();
            manager.register(logging("low", &log));
            manager.register(logging("high", &log).with_priority(10));
            manager.register(logging("mid", &log).with_priority(5));

            manager.setup_all().unwrap();
            manager.teardown_all().unwrap();

            assert_eq!(
                entries(&log),
                vec![
                    "setup:high",
                    "setup:mid",
                    "setup:low",
                    "teardown:low",
                    "teardown:mid",
                    "teardown:high",
                ]
            );
        }

        #[test]
        fn test_equal_priority_keeps_registration_order() {
            let log = Log::default();
            let mut manager = FixtureManager::new();
            manager.register(logging("a", &log));
            manager.register(logging("b", &log));
            manager.setup_all().unwrap();
            assert_eq!(entries(&log), vec!["setup:a", "setup:b"]);
            assert_eq!(manager.state("a"), Some(FixtureState::SetUp));
        }

        #[test]
        fn test_teardown_twice_is_noop() {
            let log = Log::default();
            let mut manager = FixtureManager::new();
            manager.register(logging("a", &log));
            manager.setup_all().unwrap();
            manager.teardown_all().unwrap();
            manager.teardown_all().unwrap();
            assert_eq!(entries(&log), vec!["setup:a", "teardown:a"]);
            assert_eq!(manager.state("a"), Some(FixtureState::TornDown));
        }
    }

    mod failures {
        use super::*;

        #[test]
        fn test_failed_setup_rolls_back() {
            let log = Log::default();
            let mut manager = FixtureManager::new();
            manager.register(logging("first", &log).with_priority(1));
            manager.register(
                SimpleFixture::new("broken").with_setup(|| Err(SmokeError::fixture("boom"))),
            );

            let err = manager.setup_all().unwrap_err();
            assert!(err.to_string().contains("broken"));
            assert_eq!(entries(&log), vec!["setup:first", "teardown:first"]);
            assert_eq!(manager.state("broken"), Some(FixtureState::Failed));
            assert!(!manager.has_active());
        }

        #[test]
        fn test_teardown_visits_all_and_reports_first_error() {
            let log = Log::default();
            let mut manager = FixtureManager::new();
            manager.register(logging("outer", &log).with_priority(2));
            manager.register(
                SimpleFixture::new("bad-a")
                    .with_priority(1)
                    .with_teardown(|| Err(SmokeError::fixture("a"))),
            );
            manager.register(
                SimpleFixture::new("bad-b").with_teardown(|| Err(SmokeError::fixture("b"))),
            );

            manager.setup_all().unwrap();
            let err = manager.teardown_all().unwrap_err();

            // bad-b is torn down first, so its error wins
            assert!(err.to_string().contains("bad-b"));
            assert!(entries(&log).contains(&"teardown:outer".to_string()));
            assert_eq!(manager.state("bad-a"), Some(FixtureState::Failed));
        }

        #[test]
        fn test_connection_errors_keep_their_kind() {
            let mut manager = FixtureManager::new();
            manager.register(
                SimpleFixture::new("game")
                    .with_setup(|| Err(SmokeError::connection("process exited"))),
            );
            let err = manager.setup_all().unwrap_err();
            assert!(matches!(err, SmokeError::ConnectionError { .. }));
            assert!(err.is_fatal_to_run());
            assert!(err.to_string().contains("Fixture 'game' setup failed"));

            let mut manager = FixtureManager::new();
            manager.register(
                SimpleFixture::new("game")
                    .with_teardown(|| Err(SmokeError::connection("terminate refused"))),
            );
            manager.setup_all().unwrap();
            let err = manager.teardown_all().unwrap_err();
            assert!(matches!(err, SmokeError::ConnectionError { .. }));
            assert!(err.to_string().contains("teardown failed"));
        }
    }

    mod scope {
        use super::*;

        #[test]
        fn test_drop_tears_down() {
            let log = Log::default();
            let mut manager = FixtureManager::new();
            manager.register(logging("game", &log));
            {
                let _scope = FixtureScope::enter(manager).unwrap();
                assert_eq!(entries(&log), vec!["setup:game"]);
            }
            assert_eq!(entries(&log), vec!["setup:game", "teardown:game"]);
        }

        #[test]
        fn test_explicit_teardown_then_drop_runs_once() {
            let log = Log::default();
            let mut manager = FixtureManager::new();
            manager.register(logging("game", &log));
            let mut scope = FixtureScope::enter(manager).unwrap();
            scope.teardown().unwrap();
            drop(scope);
            assert_eq!(entries(&log), vec!["setup:game", "teardown:game"]);
        }

        #[test]
        fn test_enter_failure_leaves_nothing_active() {
            let mut manager = FixtureManager::new();
            manager.register(
                SimpleFixture::new("broken").with_setup(|| Err(SmokeError::fixture("no"))),
            );
            let err = FixtureScope::enter(manager).unwrap_err();
            assert!(matches!(err, SmokeError::Fixture { .. }));
        }

        #[test]
        fn test_debug_lists_fixtures() {
            let mut manager = FixtureManager::new();
            manager.register(SimpleFixture::new("game"));
            let scope = FixtureScope::enter(manager).unwrap();
            let debug = format!("{scope:?}");
            assert!(debug.contains("game"));
        }
    }
}
