//! The external game process.
//!
//! The suite never launches the build itself; the caller does. This module
//! only observes whether the process is alive and terminates it at the end
//! of a run, wired into the fixture lifecycle by [`ProcessFixture`].

use crate::fixture::Fixture;
use crate::result::{SmokeError, SmokeResult};
use std::process::Child;
use tracing::{debug, info};

/// Handle on a running application process
pub trait AppProcess: Send {
    /// Process name used in logs and errors
    fn name(&self) -> &str;

    /// Whether the process is still alive
    fn is_running(&mut self) -> SmokeResult<bool>;

    /// Stop the process. Stopping an already exited process succeeds.
    fn terminate(&mut self) -> SmokeResult<()>;
}

/// [`AppProcess`] over a child the caller already spawned
#[derive(Debug)]
pub struct ChildProcess {
    name: String,
    child: Child,
}

impl ChildProcess {
    /// Wrap a spawned child
    #[must_use]
    pub fn new(name: impl Into<String>, child: Child) -> Self {
        Self {
            name: name.into(),
            child,
        }
    }

    /// OS process id
    #[must_use]
    pub fn id(&self) -> u32 {
        self.child.id()
    }
}

impl AppProcess for ChildProcess {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_running(&mut self) -> SmokeResult<bool> {
        Ok(self.child.try_wait()?.is_none())
    }

    fn terminate(&mut self) -> SmokeResult<()> {
        if let Some(status) = self.child.try_wait()? {
            debug!(process = %self.name, %status, "process already exited");
            return Ok(());
        }
        self.child.kill()?;
        let status = self.child.wait()?;
        info!(process = %self.name, %status, "process terminated");
        Ok(())
    }
}

/// Fixture that requires a live process at setup and terminates it at
/// teardown
#[derive(Debug)]
pub struct ProcessFixture<P> {
    process: P,
    label: String,
}

impl<P: AppProcess> ProcessFixture<P> {
    /// Manage `process`
    #[must_use]
    pub fn new(process: P) -> Self {
        let label = format!("process:{}", process.name());
        Self { process, label }
    }

    /// The wrapped process
    #[must_use]
    pub const fn process(&self) -> &P {
        &self.process
    }
}

impl<P: AppProcess> Fixture for ProcessFixture<P> {
    fn setup(&mut self) -> SmokeResult<()> {
        if self.process.is_running()? {
            Ok(())
        } else {
            Err(SmokeError::connection(format!(
                "application process '{}' is not running",
                self.process.name()
            )))
        }
    }

    fn teardown(&mut self) -> SmokeResult<()> {
        self.process.terminate()
    }

    fn name(&self) -> &str {
        &self.label
    }

    // Outlives every other fixture.
    fn priority(&self) -> i32 {
        100
    }
}
