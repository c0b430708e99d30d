//! Stand-in for the game process.

use crate::process::AppProcess;
use crate::result::{SmokeError, SmokeResult};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct ProcessState {
    running: AtomicBool,
    terminate_calls: AtomicU32,
    fail_terminate: AtomicBool,
}

/// Observer for a [`MockProcess`] that stays usable after the process has
/// been moved into a fixture
#[derive(Debug, Clone)]
pub struct MockProcessHandle {
    state: Arc<ProcessState>,
}

impl MockProcessHandle {
    /// Whether the process is alive
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }

    /// How often `terminate` was called
    #[must_use]
    pub fn terminate_calls(&self) -> u32 {
        self.state.terminate_calls.load(Ordering::SeqCst)
    }
}

/// Scripted [`AppProcess`]
#[derive(Debug)]
pub struct MockProcess {
    name: String,
    state: Arc<ProcessState>,
}

impl MockProcess {
    /// A live process
    #[must_use]
    pub fn running(name: impl Into<String>) -> Self {
        let process = Self {
            name: name.into(),
            state: Arc::default(),
        };
        process.state.running.store(true, Ordering::SeqCst);
        process
    }

    /// A process that already exited
    #[must_use]
    pub fn exited(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::default(),
        }
    }

    /// Make `terminate` fail
    #[must_use]
    pub fn failing_terminate(self) -> Self {
        self.state.fail_terminate.store(true, Ordering::SeqCst);
        self
    }

    /// Observer handle
    #[must_use]
    pub fn handle(&self) -> MockProcessHandle {
        MockProcessHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl AppProcess for MockProcess {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_running(&mut self) -> SmokeResult<bool> {
        Ok(self.state.running.load(Ordering::SeqCst))
    }

    fn terminate(&mut self) -> SmokeResult<()> {
        let _ = self.state.terminate_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_terminate.load(Ordering::SeqCst) {
            return Err(SmokeError::fixture(format!(
                "could not stop '{}'",
                self.name
            )));
        }
        self.state.running.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_terminate_stops_process() {
        let mut process = MockProcess::running("LyraGame");
        let handle = process.handle();
        process.terminate().unwrap();
        assert!(!handle.is_running());
        assert_eq!(handle.terminate_calls(), 1);
    }

    #[test]
    fn test_failing_terminate_keeps_running() {
        let mut process = MockProcess::running("LyraGame").failing_terminate();
        assert!(process.terminate().is_err());
        assert!(process.is_running().unwrap());
        assert_eq!(process.handle().terminate_calls(), 1);
    }
}
