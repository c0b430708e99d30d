//! Remote automation client contract.
//!
//! The automation server and its wire protocol live outside this crate. A
//! scenario only ever talks to [`AutomationClient`]; concrete transports (and
//! the scripted [`crate::mock::MockClient`]) implement it.
//!
//! ```text
//! ┌──────────────┐   Connect::connect(host)   ┌────────────────────┐
//! │ Session      │ ─────────────────────────► │ AutomationClient   │
//! │ (lifecycle)  │                            │ (blocking req/resp)│
//! └──────┬───────┘                            └─────────┬──────────┘
//!        │ &mut client                                  │
//!        ▼                                              ▼
//! ┌──────────────┐                            ┌────────────────────┐
//! │ Scenario     │  wait / click / read / call│ running game build │
//! │ Driver       │ ─────────────────────────► │ (object graph)     │
//! └──────────────┘                            └────────────────────┘
//! ```

use crate::geometry::{EulerRotation3, Position3};
use crate::locator::Locator;
use crate::result::SmokeResult;
use crate::wait::{WaitOptions, Waiter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mouse button used for pointer actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    /// Primary button
    #[default]
    Left,
    /// Secondary button
    Right,
    /// Wheel button
    Middle,
}

impl MouseButton {
    /// Numeric button id used by most automation servers (left = 1)
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Left => 1,
            Self::Right => 2,
            Self::Middle => 3,
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Middle => "middle",
        };
        f.write_str(name)
    }
}

/// Lightweight handle to a remote object returned by field reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Object name
    #[serde(default)]
    pub name: String,
    /// Full hierarchy path, usable as a locator
    pub hierarchy_path: Locator,
}

impl ObjectRef {
    /// Create an object reference
    #[must_use]
    pub fn new(name: impl Into<String>, hierarchy_path: impl Into<Locator>) -> Self {
        Self {
            name: name.into(),
            hierarchy_path: hierarchy_path.into(),
        }
    }
}

/// Typed value read from a remote object's field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Reference to another object
    Object(ObjectRef),
    /// Floating point number
    Float(f64),
    /// Integer
    Int(i64),
    /// Boolean
    Bool(bool),
    /// String
    Text(String),
    /// World position
    Position(Position3),
    /// Euler rotation
    Rotation(EulerRotation3),
}

impl FieldValue {
    /// Object reference, if this is one
    #[must_use]
    pub const fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Short type name for diagnostics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Float(_) => "float",
            Self::Int(_) => "int",
            Self::Bool(_) => "bool",
            Self::Text(_) => "text",
            Self::Position(_) => "position",
            Self::Rotation(_) => "rotation",
        }
    }
}

/// Argument passed to a remote method call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MethodArg {
    /// String argument (asset paths, names)
    Text(String),
    /// Floating point argument
    Float(f64),
    /// Integer argument
    Int(i64),
    /// Boolean argument
    Bool(bool),
    /// Position argument
    Position(Position3),
    /// Rotation argument, converted to an engine rotator on the remote side
    Rotation(EulerRotation3),
}

impl MethodArg {
    /// Rotation payload, if this is one
    #[must_use]
    pub const fn as_rotation(&self) -> Option<EulerRotation3> {
        match self {
            Self::Rotation(r) => Some(*r),
            _ => None,
        }
    }
}

/// Synchronous access into a running application's object graph.
///
/// Every call is a blocking request/response. Implementations report
/// transport failures as [`crate::SmokeError::ConnectionError`].
pub trait AutomationClient {
    /// Whether an object currently matches `locator`
    fn object_exists(&mut self, locator: &Locator) -> SmokeResult<bool>;

    /// Block until `locator` resolves or the wait budget is spent.
    ///
    /// The default polls [`Self::object_exists`] with backoff; transports
    /// with a server-side wait should override it.
    fn wait_for_object(&mut self, locator: &Locator, options: &WaitOptions) -> SmokeResult<bool> {
        let waiter = Waiter::with_options(options.clone());
        let result = waiter.poll_until(locator.as_str(), || self.object_exists(locator))?;
        Ok(result.success)
    }

    /// Move the pointer over an object
    fn mouse_move_to_object(&mut self, locator: &Locator, button: MouseButton)
        -> SmokeResult<()>;

    /// Click an object `click_count` times
    fn click_object(
        &mut self,
        button: MouseButton,
        locator: &Locator,
        click_count: u32,
    ) -> SmokeResult<()>;

    /// World position of an object
    fn object_position(&mut self, locator: &Locator) -> SmokeResult<Position3>;

    /// World rotation of an object
    fn object_rotation(&mut self, locator: &Locator) -> SmokeResult<EulerRotation3>;

    /// Read a field; `Ok(None)` when the object or field has no value
    fn field_value(&mut self, locator: &Locator, field: &str) -> SmokeResult<Option<FieldValue>>;

    /// Invoke a method on a remote object
    fn call_method(&mut self, locator: &Locator, method: &str, args: &[MethodArg])
        -> SmokeResult<()>;

    /// Close the connection
    fn disconnect(&mut self) -> SmokeResult<()>;
}

impl<C: AutomationClient + ?Sized> AutomationClient for &mut C {
    fn object_exists(&mut self, locator: &Locator) -> SmokeResult<bool> {
        (**self).object_exists(locator)
    }

    fn wait_for_object(&mut self, locator: &Locator, options: &WaitOptions) -> SmokeResult<bool> {
        (**self).wait_for_object(locator, options)
    }

    fn mouse_move_to_object(
        &mut self,
        locator: &Locator,
        button: MouseButton,
    ) -> SmokeResult<()> {
        (**self).mouse_move_to_object(locator, button)
    }

    fn click_object(
        &mut self,
        button: MouseButton,
        locator: &Locator,
        click_count: u32,
    ) -> SmokeResult<()> {
        (**self).click_object(button, locator, click_count)
    }

    fn object_position(&mut self, locator: &Locator) -> SmokeResult<Position3> {
        (**self).object_position(locator)
    }

    fn object_rotation(&mut self, locator: &Locator) -> SmokeResult<EulerRotation3> {
        (**self).object_rotation(locator)
    }

    fn field_value(&mut self, locator: &Locator, field: &str) -> SmokeResult<Option<FieldValue>> {
        (**self).field_value(locator, field)
    }

    fn call_method(
        &mut self,
        locator: &Locator,
        method: &str,
        args: &[MethodArg],
    ) -> SmokeResult<()> {
        (**self).call_method(locator, method, args)
    }

    fn disconnect(&mut self) -> SmokeResult<()> {
        (**self).disconnect()
    }
}

/// Opens connections to an automation server
pub trait Connect {
    /// Client type produced by this connector
    type Client: AutomationClient;

    /// Connect to `host`; unreachable servers yield `ConnectionError`
    fn connect(&self, host: &str) -> SmokeResult<Self::Client>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mouse_button_ids() {
        assert_eq!(MouseButton::Left.id(), 1);
        assert_eq!(MouseButton::Right.id(), 2);
        assert_eq!(MouseButton::Middle.id(), 3);
        assert_eq!(MouseButton::default(), MouseButton::Left);
    }

    #[test]
    fn test_field_value_object_yaml() {
        let yaml = r#"
type: object
value:
  name: B_Hero_ShooterMannequin_C_0
  hierarchy_path: /Game/B_Hero_ShooterMannequin_C_0
"#;
        let value: FieldValue = serde_yaml_ng::from_str(yaml).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.hierarchy_path.as_str(), "/Game/B_Hero_ShooterMannequin_C_0");
        assert_eq!(value.kind(), "object");
    }

    #[test]
    fn test_field_value_kind_for_scalars() {
        assert_eq!(FieldValue::Float(1.0).kind(), "float");
        assert_eq!(FieldValue::Text("x".into()).kind(), "text");
        assert!(FieldValue::Bool(true).as_object().is_none());
    }

    #[test]
    fn test_method_arg_rotation_yaml() {
        let arg: MethodArg =
            serde_yaml_ng::from_str("{type: rotation, value: [15.0, 45.0, 0.0]}").unwrap();
        assert_eq!(arg.as_rotation(), Some(EulerRotation3::new(15.0, 45.0, 0.0)));
    }

    #[test]
    fn test_method_arg_text_yaml() {
        let arg: MethodArg =
            serde_yaml_ng::from_str("{type: text, value: /Game/Input/Actions/IA_Jump.IA_Jump}")
                .unwrap();
        assert_eq!(arg, MethodArg::Text("/Game/Input/Actions/IA_Jump.IA_Jump".into()));
        assert!(arg.as_rotation().is_none());
    }
}
