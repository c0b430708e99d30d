//! Captured values and `${name}` locator interpolation.

use crate::client::{FieldValue, MethodArg};
use crate::geometry::{EulerRotation3, Position3};
use crate::locator::Locator;
use crate::result::{SmokeError, SmokeResult};
use std::collections::BTreeMap;

/// Nesting limit for catalog locators that reference each other
pub const MAX_INTERPOLATION_DEPTH: usize = 8;

/// Names referenced as `${name}` in `template`, in order of appearance.
///
/// # Errors
///
/// `InvalidInput` for an unterminated `${` or an empty name.
pub fn placeholders(template: &str) -> SmokeResult<Vec<&str>> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            SmokeError::invalid_input(format!("unterminated '${{' in locator '{template}'"))
        })?;
        let name = &after[..end];
        if name.trim().is_empty() {
            return Err(SmokeError::invalid_input(format!(
                "empty placeholder in locator '{template}'"
            )));
        }
        names.push(name);
        rest = &after[end + 1..];
    }
    Ok(names)
}

/// Values captured by earlier steps of the running scenario
#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: BTreeMap<String, FieldValue>,
}

impl Variables {
    /// No captures yet
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or overwrite) a capture
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let _ = self.values.insert(name.into(), value);
    }

    /// Captured value, if any
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Number of captures
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was captured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn require(&self, name: &str) -> SmokeResult<&FieldValue> {
        self.get(name)
            .ok_or_else(|| SmokeError::invalid_input(format!("no value captured as '{name}'")))
    }

    /// Captured position.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if missing or not a position.
    pub fn position(&self, name: &str) -> SmokeResult<Position3> {
        match self.require(name)? {
            FieldValue::Position(p) => Ok(*p),
            other => Err(SmokeError::invalid_input(format!(
                "'{name}' holds a {}, expected a position",
                other.kind()
            ))),
        }
    }

    /// Captured rotation.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if missing or not a rotation.
    pub fn rotation(&self, name: &str) -> SmokeResult<EulerRotation3> {
        match self.require(name)? {
            FieldValue::Rotation(r) => Ok(*r),
            other => Err(SmokeError::invalid_input(format!(
                "'{name}' holds a {}, expected a rotation",
                other.kind()
            ))),
        }
    }

    /// Captured value as a method argument; object references pass their
    /// hierarchy path as text.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if nothing was captured under `name`.
    pub fn method_arg(&self, name: &str) -> SmokeResult<MethodArg> {
        Ok(match self.require(name)? {
            FieldValue::Object(obj) => MethodArg::Text(obj.hierarchy_path.to_string()),
            FieldValue::Float(v) => MethodArg::Float(*v),
            FieldValue::Int(v) => MethodArg::Int(*v),
            FieldValue::Bool(v) => MethodArg::Bool(*v),
            FieldValue::Text(v) => MethodArg::Text(v.clone()),
            FieldValue::Position(v) => MethodArg::Position(*v),
            FieldValue::Rotation(v) => MethodArg::Rotation(*v),
        })
    }

    /// Expand every `${name}` in `template`.
    ///
    /// Captured values win over catalog locators. Object captures expand to
    /// their hierarchy path, text captures verbatim; catalog locators are
    /// expanded recursively.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for unknown names, captures that are not object or
    /// text, malformed placeholders, or nesting deeper than
    /// [`MAX_INTERPOLATION_DEPTH`].
    pub fn interpolate(
        &self,
        template: &str,
        locators: &BTreeMap<String, String>,
    ) -> SmokeResult<Locator> {
        self.expand(template, locators, 0).map(Locator::new)
    }

    fn expand(
        &self,
        template: &str,
        locators: &BTreeMap<String, String>,
        depth: usize,
    ) -> SmokeResult<String> {
        if depth > MAX_INTERPOLATION_DEPTH {
            return Err(SmokeError::invalid_input(format!(
                "locator references nest deeper than {MAX_INTERPOLATION_DEPTH} in '{template}'"
            )));
        }
        // Reject malformed placeholders before any lookup
        let _ = placeholders(template)?;
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        // Substituted text is never rescanned.
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find('}').unwrap_or(after.len());
            out.push_str(&self.lookup(&after[..end], locators, depth)?);
            rest = after.get(end + 1..).unwrap_or("");
        }
        out.push_str(rest);
        Ok(out)
    }

    fn lookup(
        &self,
        name: &str,
        locators: &BTreeMap<String, String>,
        depth: usize,
    ) -> SmokeResult<String> {
        match (self.get(name), locators.get(name)) {
            (Some(FieldValue::Object(obj)), _) => Ok(obj.hierarchy_path.to_string()),
            (Some(FieldValue::Text(text)), _) => Ok(text.clone()),
            (Some(other), _) => Err(SmokeError::invalid_input(format!(
                "'{name}' holds a {} and cannot be used in a locator",
                other.kind()
            ))),
            (None, Some(nested)) => self.expand(nested, locators, depth + 1),
            (None, None) => Err(SmokeError::invalid_input(format!(
                "unknown locator reference '${{{name}}}'"
            ))),
        }
    }
}
