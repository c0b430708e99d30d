//! Locators: path-like queries into the remote scene graph.
//!
//! A locator is opaque to this crate. It is produced by the automation
//! server (an object's hierarchy path) or assembled from a known ancestor
//! plus a relative suffix. Builders here only concatenate; nothing is parsed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Path expression identifying a UI widget or scene actor
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    /// Wrap an existing path expression
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Any object whose name contains `fragment`, e.g.
    /// `//*[contains(@name, 'W_LyraFrontEnd_C')]`
    #[must_use]
    pub fn name_contains(fragment: &str) -> Self {
        Self(format!("//*[contains(@name, '{fragment}')]"))
    }

    /// A descendant of this object: `{self}//{suffix}`
    #[must_use]
    pub fn descendant(&self, suffix: &str) -> Self {
        Self(format!("{}//{}", self.0, suffix.trim_start_matches('/')))
    }

    /// A component attached to this actor: `{self}/fn:component('{kind}')`
    #[must_use]
    pub fn component(&self, kind: &str) -> Self {
        Self(format!("{}/fn:component('{kind}')", self.0))
    }

    /// The raw path expression
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the path expression is blank
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Locator {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Locator {
    fn from(path: String) -> Self {
        Self(path)
    }
}

impl AsRef<str> for Locator {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_contains() {
        let locator = Locator::name_contains("W_LyraFrontEnd_C");
        assert_eq!(locator.as_str(), "//*[contains(@name, 'W_LyraFrontEnd_C')]");
    }

    #[test]
    fn test_descendant() {
        let menu = Locator::name_contains("W_LyraFrontEnd_C");
        let button = menu.descendant("StartGameButton");
        assert_eq!(
            button.as_str(),
            "//*[contains(@name, 'W_LyraFrontEnd_C')]//StartGameButton"
        );
    }

    #[test]
    fn test_descendant_strips_leading_slashes() {
        let root = Locator::new("/Root");
        assert_eq!(root.descendant("//Child").as_str(), "/Root//Child");
    }

    #[test]
    fn test_component() {
        let pawn = Locator::new("/Game/Maps/L_Expanse/B_Hero_ShooterMannequin_C_0");
        assert_eq!(
            pawn.component("CameraComponent").as_str(),
            "/Game/Maps/L_Expanse/B_Hero_ShooterMannequin_C_0/fn:component('CameraComponent')"
        );
    }

    #[test]
    fn test_is_empty() {
        assert!(Locator::new("  ").is_empty());
        assert!(!Locator::new("//x").is_empty());
    }

    #[test]
    fn test_serde_transparent() {
        let locator: Locator = serde_json::from_str(r#""//Player""#).unwrap();
        assert_eq!(locator, Locator::new("//Player"));
        assert_eq!(serde_json::to_string(&locator).unwrap(), r#""//Player""#);
    }
}
