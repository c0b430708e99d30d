//! Scripted scene description and its mutable runtime state.

use crate::client::{FieldValue, MethodArg, MouseButton};
use crate::geometry::{EulerRotation3, Position3, Vector3};
use crate::locator::Locator;
use crate::result::{SmokeError, SmokeResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Side effect of a click or method call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneEffect {
    /// Move an object by `delta`
    Translate {
        /// Object to move
        target: Locator,
        /// Displacement
        delta: Vector3,
    },
    /// Set an object's rotation from the call's first rotation argument
    SetRotation {
        /// Object to rotate
        target: Locator,
    },
    /// Make a hidden object visible
    Reveal {
        /// Object to reveal
        locator: Locator,
    },
}

/// One object in the scripted scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Locator the object answers to
    pub locator: Locator,
    /// Number of existence polls that report `false` before it shows up
    #[serde(default)]
    pub appears_after: u32,
    /// Invisible until revealed by an effect
    #[serde(default)]
    pub hidden: bool,
    /// World position
    #[serde(default)]
    pub position: Option<Position3>,
    /// World rotation
    #[serde(default)]
    pub rotation: Option<EulerRotation3>,
    /// Readable fields
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    /// Effects applied when clicked
    #[serde(default)]
    pub on_click: Vec<SceneEffect>,
    /// Effects applied per method name
    #[serde(default)]
    pub methods: BTreeMap<String, Vec<SceneEffect>>,
}

impl SceneObject {
    /// Visible object at `locator`
    #[must_use]
    pub fn new(locator: impl Into<Locator>) -> Self {
        Self {
            locator: locator.into(),
            appears_after: 0,
            hidden: false,
            position: None,
            rotation: None,
            fields: BTreeMap::new(),
            on_click: Vec::new(),
            methods: BTreeMap::new(),
        }
    }

    /// Hide until something reveals it
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Report absent for the first `polls` existence checks
    #[must_use]
    pub const fn appears_after(mut self, polls: u32) -> Self {
        self.appears_after = polls;
        self
    }

    /// Set the position
    #[must_use]
    pub const fn with_position(mut self, position: Position3) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the rotation
    #[must_use]
    pub const fn with_rotation(mut self, rotation: EulerRotation3) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Add a readable field
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        let _ = self.fields.insert(name.into(), value);
        self
    }

    /// Add a click effect
    #[must_use]
    pub fn on_click(mut self, effect: SceneEffect) -> Self {
        self.on_click.push(effect);
        self
    }

    /// Add an effect to a method
    #[must_use]
    pub fn on_method(mut self, method: impl Into<String>, effect: SceneEffect) -> Self {
        self.methods.entry(method.into()).or_default().push(effect);
        self
    }
}

/// Everything the mock client was asked to do, in order
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    /// `object_exists`
    Exists(Locator),
    /// `mouse_move_to_object`
    MouseMove {
        /// Target
        locator: Locator,
        /// Button
        button: MouseButton,
    },
    /// `click_object`
    Click {
        /// Target
        locator: Locator,
        /// Button
        button: MouseButton,
        /// Click count
        count: u32,
    },
    /// `object_position`
    Position(Locator),
    /// `object_rotation`
    Rotation(Locator),
    /// `field_value`
    Field {
        /// Target
        locator: Locator,
        /// Field name
        field: String,
    },
    /// `call_method`
    Method {
        /// Target
        locator: Locator,
        /// Method name
        method: String,
        /// Arguments
        args: Vec<MethodArg>,
    },
    /// `disconnect`
    Disconnect,
}

/// A scripted scene: static description plus what has happened so far.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockScene {
    /// Scene objects
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    /// Drop the connection after this many client calls
    #[serde(default)]
    pub connection_drops_after: Option<usize>,
    #[serde(skip)]
    polls: HashMap<Locator, u32>,
    #[serde(skip)]
    calls: Vec<MockCall>,
}

impl MockScene {
    /// Empty scene
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a scene from YAML
    ///
    /// # Errors
    ///
    /// Malformed YAML.
    pub fn from_yaml(yaml: &str) -> SmokeResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load a scene file
    ///
    /// # Errors
    ///
    /// Unreadable file or malformed YAML.
    pub fn from_path(path: impl AsRef<Path>) -> SmokeResult<Self> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    /// Add an object
    #[must_use]
    pub fn with_object(mut self, object: SceneObject) -> Self {
        self.objects.push(object);
        self
    }

    /// Fail every call after `calls` calls with a connection error
    #[must_use]
    pub const fn with_connection_drop_after(mut self, calls: usize) -> Self {
        self.connection_drops_after = Some(calls);
        self
    }

    /// Calls recorded so far
    #[must_use]
    pub fn calls(&self) -> &[MockCall] {
        &self.calls
    }

    /// Object registered under `locator`, visible or not
    #[must_use]
    pub fn object(&self, locator: &Locator) -> Option<&SceneObject> {
        self.objects.iter().find(|o| &o.locator == locator)
    }

    fn object_mut(&mut self, locator: &Locator) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| &o.locator == locator)
    }

    pub(crate) fn record(&mut self, call: MockCall) -> SmokeResult<()> {
        if let Some(limit) = self.connection_drops_after {
            if self.calls.len() >= limit {
                return Err(SmokeError::connection("mock connection dropped"));
            }
        }
        self.calls.push(call);
        Ok(())
    }

    /// Existence check that counts towards `appears_after`
    pub(crate) fn poll_exists(&mut self, locator: &Locator) -> bool {
        let exists = self.is_visible(locator);
        let polls = self.polls.entry(locator.clone()).or_insert(0);
        *polls = polls.saturating_add(1);
        exists
    }

    /// Whether the object is visible right now, without counting a poll
    pub(crate) fn is_visible(&self, locator: &Locator) -> bool {
        let seen = self.polls.get(locator).copied().unwrap_or(0);
        self.object(locator)
            .is_some_and(|o| !o.hidden && seen >= o.appears_after)
    }

    pub(crate) fn visible(&self, locator: &Locator) -> SmokeResult<&SceneObject> {
        if self.is_visible(locator) {
            self.object(locator)
                .ok_or_else(|| SmokeError::not_found(locator.as_str()))
        } else {
            Err(SmokeError::not_found(locator.as_str()))
        }
    }

    pub(crate) fn click(&mut self, locator: &Locator) -> SmokeResult<()> {
        let effects = self.visible(locator)?.on_click.clone();
        self.apply(&effects, &[])
    }

    pub(crate) fn invoke(
        &mut self,
        locator: &Locator,
        method: &str,
        args: &[MethodArg],
    ) -> SmokeResult<()> {
        let effects = self
            .visible(locator)?
            .methods
            .get(method)
            .cloned()
            .unwrap_or_default();
        self.apply(&effects, args)
    }

    fn apply(&mut self, effects: &[SceneEffect], args: &[MethodArg]) -> SmokeResult<()> {
        for effect in effects {
            match effect {
                SceneEffect::Translate { target, delta } => {
                    let object = self
                        .object_mut(target)
                        .ok_or_else(|| SmokeError::not_found(target.as_str()))?;
                    let from = object.position.unwrap_or_default();
                    object.position = Some(from + *delta);
                }
                SceneEffect::SetRotation { target } => {
                    let rotation = args
                        .iter()
                        .find_map(MethodArg::as_rotation)
                        .ok_or_else(|| {
                            SmokeError::invalid_input("set_rotation needs a rotation argument")
                        })?;
                    let object = self
                        .object_mut(target)
                        .ok_or_else(|| SmokeError::not_found(target.as_str()))?;
                    object.rotation = Some(rotation);
                }
                SceneEffect::Reveal { locator } => {
                    let object = self
                        .object_mut(locator)
                        .ok_or_else(|| SmokeError::not_found(locator.as_str()))?;
                    object.hidden = false;
                    object.appears_after = 0;
                }
            }
        }
        Ok(())
    }
}
