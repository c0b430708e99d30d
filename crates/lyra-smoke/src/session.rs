//! One connection to the automation server for the whole run.
//!
//! A [`Session`] is opened once, lends its client to every scenario and is
//! closed once. Closing disconnects first and then tears fixtures down in
//! reverse order; dropping an unclosed session does the same, so the game
//! process is stopped even when a scenario panics.

use crate::client::{AutomationClient, Connect};
use crate::fixture::{FixtureManager, FixtureScope};
use crate::result::{SmokeError, SmokeResult};
use tracing::{info, warn};

/// Connected client plus the fixtures it depends on
#[derive(Debug)]
pub struct Session<C: AutomationClient> {
    host: String,
    client: Option<C>,
    fixtures: FixtureScope,
}

impl<C: AutomationClient> Session<C> {
    /// Set up `fixtures`, then connect to `host`.
    ///
    /// # Errors
    ///
    /// Fixture setup failures, or the connector's `ConnectionError`. When the
    /// connection fails the fixtures are torn down before returning.
    pub fn open<K>(connector: &K, host: &str, fixtures: FixtureManager) -> SmokeResult<Self>
    where
        K: Connect<Client = C>,
    {
        let mut scope = FixtureScope::enter(fixtures)?;
        match connector.connect(host) {
            Ok(client) => {
                info!(host, "session opened");
                Ok(Self {
                    host: host.to_string(),
                    client: Some(client),
                    fixtures: scope,
                })
            }
            Err(e) => {
                warn!(host, error = %e, "connection failed; tearing down fixtures");
                if let Err(teardown) = scope.teardown() {
                    warn!(error = %teardown, "teardown after failed connect");
                }
                Err(e)
            }
        }
    }

    /// Host this session is connected to
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether [`Session::close`] has not run yet
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.client.is_some()
    }

    /// The live client.
    ///
    /// # Errors
    ///
    /// `InvalidState` once the session is closed.
    pub fn client(&mut self) -> SmokeResult<&mut C> {
        self.client
            .as_mut()
            .ok_or_else(|| SmokeError::invalid_state("session is closed"))
    }

    /// Disconnect, then tear down fixtures. Runs once; later calls are no-ops.
    ///
    /// # Errors
    ///
    /// The disconnect error if there was one, otherwise the first teardown
    /// error. Teardown runs either way.
    pub fn close(&mut self) -> SmokeResult<()> {
        let disconnected = match self.client.take() {
            Some(mut client) => client.disconnect(),
            None => return Ok(()),
        };
        if let Err(e) = &disconnected {
            warn!(host = %self.host, error = %e, "disconnect failed");
        }
        let torn_down = self.fixtures.teardown();
        info!(host = %self.host, "session closed");
        disconnected.and(torn_down)
    }
}

impl<C: AutomationClient> Drop for Session<C> {
    fn drop(&mut self) {
        if self.is_open() {
            if let Err(e) = self.close() {
                warn!(error = %e, "session cleanup on drop failed");
            }
        }
    }
}
