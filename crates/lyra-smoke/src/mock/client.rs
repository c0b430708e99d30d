//! In-memory [`AutomationClient`] over a shared [`MockScene`].

use super::scene::{MockCall, MockScene};
use crate::client::{AutomationClient, Connect, FieldValue, MethodArg, MouseButton};
use crate::geometry::{EulerRotation3, Position3};
use crate::locator::Locator;
use crate::result::{SmokeError, SmokeResult};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

type SharedScene = Arc<Mutex<MockScene>>;

fn lock(scene: &SharedScene) -> SmokeResult<MutexGuard<'_, MockScene>> {
    scene
        .lock()
        .map_err(|_| SmokeError::connection("mock scene lock poisoned"))
}

/// Hands out [`MockClient`]s that all share one scene
#[derive(Debug, Clone)]
pub struct MockConnector {
    scene: SharedScene,
    reachable: bool,
}

impl MockConnector {
    /// Connector for `scene`
    #[must_use]
    pub fn new(scene: MockScene) -> Self {
        Self {
            scene: Arc::new(Mutex::new(scene)),
            reachable: true,
        }
    }

    /// Connector whose server refuses every connection
    #[must_use]
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new(MockScene::new())
        }
    }

    /// Snapshot of the calls made so far by every client
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.scene)
            .map(|scene| scene.calls().to_vec())
            .unwrap_or_default()
    }

    /// Inspect the current scene state
    pub fn with_scene<R>(&self, f: impl FnOnce(&MockScene) -> R) -> SmokeResult<R> {
        Ok(f(&*lock(&self.scene)?))
    }
}

impl Connect for MockConnector {
    type Client = MockClient;

    fn connect(&self, host: &str) -> SmokeResult<MockClient> {
        if !self.reachable {
            return Err(SmokeError::connection(format!(
                "no automation server listening on {host}"
            )));
        }
        debug!(host, "mock client connected");
        Ok(MockClient {
            scene: Arc::clone(&self.scene),
            connected: true,
        })
    }
}

/// Scripted client; every call is recorded on the shared scene
#[derive(Debug)]
pub struct MockClient {
    scene: SharedScene,
    connected: bool,
}

impl MockClient {
    /// Standalone client over its own scene
    #[must_use]
    pub fn new(scene: MockScene) -> Self {
        Self {
            scene: Arc::new(Mutex::new(scene)),
            connected: true,
        }
    }

    /// Whether `disconnect` has not been called yet
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Snapshot of the calls made so far
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.scene)
            .map(|scene| scene.calls().to_vec())
            .unwrap_or_default()
    }

    fn scene(&self, call: MockCall) -> SmokeResult<MutexGuard<'_, MockScene>> {
        if !self.connected {
            return Err(SmokeError::connection("client is disconnected"));
        }
        let mut scene = lock(&self.scene)?;
        scene.record(call)?;
        Ok(scene)
    }
}

impl AutomationClient for MockClient {
    fn object_exists(&mut self, locator: &Locator) -> SmokeResult<bool> {
        Ok(self
            .scene(MockCall::Exists(locator.clone()))?
            .poll_exists(locator))
    }

    fn mouse_move_to_object(&mut self, locator: &Locator, button: MouseButton) -> SmokeResult<()> {
        let scene = self.scene(MockCall::MouseMove {
            locator: locator.clone(),
            button,
        })?;
        scene.visible(locator)?;
        Ok(())
    }

    fn click_object(
        &mut self,
        button: MouseButton,
        locator: &Locator,
        click_count: u32,
    ) -> SmokeResult<()> {
        self.scene(MockCall::Click {
            locator: locator.clone(),
            button,
            count: click_count,
        })?
        .click(locator)
    }

    fn object_position(&mut self, locator: &Locator) -> SmokeResult<Position3> {
        self.scene(MockCall::Position(locator.clone()))?
            .visible(locator)?
            .position
            .ok_or_else(|| SmokeError::not_found(locator.as_str()))
    }

    fn object_rotation(&mut self, locator: &Locator) -> SmokeResult<EulerRotation3> {
        self.scene(MockCall::Rotation(locator.clone()))?
            .visible(locator)?
            .rotation
            .ok_or_else(|| SmokeError::not_found(locator.as_str()))
    }

    fn field_value(&mut self, locator: &Locator, field: &str) -> SmokeResult<Option<FieldValue>> {
        let scene = self.scene(MockCall::Field {
            locator: locator.clone(),
            field: field.to_string(),
        })?;
        if !scene.is_visible(locator) {
            return Ok(None);
        }
        let value = scene
            .object(locator)
            .and_then(|o| o.fields.get(field))
            .cloned();
        Ok(value)
    }

    fn call_method(
        &mut self,
        locator: &Locator,
        method: &str,
        args: &[MethodArg],
    ) -> SmokeResult<()> {
        self.scene(MockCall::Method {
            locator: locator.clone(),
            method: method.to_string(),
            args: args.to_vec(),
        })?
        .invoke(locator, method, args)
    }

    fn disconnect(&mut self) -> SmokeResult<()> {
        if self.connected {
            lock(&self.scene)?.record(MockCall::Disconnect)?;
            self.connected = false;
        }
        Ok(())
    }
}
