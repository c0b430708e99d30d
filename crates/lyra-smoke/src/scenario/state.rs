//! Scenario phase machine.
//!
//! ```text
//! NotStarted ──► WaitingForMenu ──► InMatch ──► Done
//!                     │    └───────────────────► Done
//!                     └──────────┴──────────────► Failed
//! ```

use crate::result::{SmokeError, SmokeResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a scenario currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing executed yet
    #[default]
    NotStarted,
    /// Front-end menus are being driven
    WaitingForMenu,
    /// A match is loaded and the HUD is up
    InMatch,
    /// All steps passed
    Done,
    /// A step failed
    Failed,
}

impl Phase {
    /// `Done` or `Failed`
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether a step may name this phase in `enter`
    #[must_use]
    pub const fn is_enterable(self) -> bool {
        matches!(self, Self::WaitingForMenu | Self::InMatch)
    }

    /// Whether `self → to` is a legal transition
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::NotStarted, Self::WaitingForMenu)
                | (Self::WaitingForMenu, Self::InMatch | Self::Done)
                | (Self::InMatch, Self::Done)
                | (Self::NotStarted | Self::WaitingForMenu | Self::InMatch, Self::Failed)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not_started",
            Self::WaitingForMenu => "waiting_for_menu",
            Self::InMatch => "in_match",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Current phase plus the transitions taken to get there
#[derive(Debug, Clone, Default)]
pub struct PhaseTracker {
    current: Phase,
    history: Vec<Phase>,
}

impl PhaseTracker {
    /// Tracker in `NotStarted`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase
    #[must_use]
    pub const fn current(&self) -> Phase {
        self.current
    }

    /// Every phase entered so far, oldest first
    #[must_use]
    pub fn history(&self) -> &[Phase] {
        &self.history
    }

    /// Move to `to`.
    ///
    /// # Errors
    ///
    /// `InvalidState` for any transition outside the machine.
    pub fn transition(&mut self, to: Phase) -> SmokeResult<()> {
        if !self.current.can_transition_to(to) {
            return Err(SmokeError::invalid_state(format!(
                "cannot move from {} to {to}",
                self.current
            )));
        }
        self.history.push(to);
        self.current = to;
        Ok(())
    }

    /// Move to `Failed` unless already terminal
    pub fn fail(&mut self) {
        if !self.current.is_terminal() {
            self.history.push(Phase::Failed);
            self.current = Phase::Failed;
        }
    }
}

/// Dry-run the phase changes a step list would make: start, every `enter`
/// in order, then finish.
///
/// # Errors
///
/// `InvalidState` naming the first step whose `enter` is illegal, or when
/// the scenario could not finish from its last phase.
pub fn check_phase_path<'a, I>(enters: I) -> SmokeResult<Phase>
where
    I: IntoIterator<Item = (&'a str, Phase)>,
{
    let mut tracker = PhaseTracker::new();
    tracker.transition(Phase::WaitingForMenu)?;
    for (step, phase) in enters {
        if !phase.is_enterable() {
            return Err(SmokeError::invalid_state(format!(
                "step '{step}' cannot enter {phase}"
            )));
        }
        tracker
            .transition(phase)
            .map_err(|e| SmokeError::invalid_state(format!("step '{step}': {e}")))?;
    }
    let last = tracker.current();
    tracker.transition(Phase::Done)?;
    Ok(last)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod transitions {
        use super::*;

        #[test]
        fn test_happy_path() {
            let mut tracker = PhaseTracker::new();
            tracker.transition(Phase::WaitingForMenu).unwrap();
            tracker.transition(Phase::InMatch).unwrap();
            tracker.transition(Phase::Done).unwrap();
            assert_eq!(
                tracker.history(),
                &[Phase::WaitingForMenu, Phase::InMatch, Phase::Done]
            );
        }

        #[test]
        fn test_menu_only_scenario_may_finish() {
            assert!(Phase::WaitingForMenu.can_transition_to(Phase::Done));
        }

        #[test]
        fn test_illegal_transitions_rejected() {
            let illegal = [
                (Phase::NotStarted, Phase::InMatch),
                (Phase::NotStarted, Phase::Done),
                (Phase::InMatch, Phase::WaitingForMenu),
                (Phase::Done, Phase::Failed),
                (Phase::Failed, Phase::Done),
                (Phase::InMatch, Phase::InMatch),
            ];
            for (from, to) in illegal {
                assert!(!from.can_transition_to(to), "{from} -> {to} should be illegal");
            }
        }

        #[test]
        fn test_transition_error_is_invalid_state() {
            let mut tracker = PhaseTracker::new();
            let err = tracker.transition(Phase::InMatch).unwrap_err();
            assert!(matches!(err, SmokeError::InvalidState { .. }));
            assert_eq!(tracker.current(), Phase::NotStarted);
        }

        #[test]
        fn test_fail_from_any_non_terminal() {
            for start in [Phase::NotStarted, Phase::WaitingForMenu, Phase::InMatch] {
                assert!(start.can_transition_to(Phase::Failed));
            }
            let mut tracker = PhaseTracker::new();
            tracker.transition(Phase::WaitingForMenu).unwrap();
            tracker.transition(Phase::Done).unwrap();
            tracker.fail();
            assert_eq!(tracker.current(), Phase::Done);
        }
    }

    mod path_check {
        use super::*;

        #[test]
        fn test_menu_only_path() {
            let none: Vec<(&str, Phase)> = Vec::new();
            assert_eq!(check_phase_path(none).unwrap(), Phase::WaitingForMenu);
        }

        #[test]
        fn test_match_path() {
            let last = check_phase_path([("hud_visible", Phase::InMatch)]).unwrap();
            assert_eq!(last, Phase::InMatch);
        }

        #[test]
        fn test_double_enter_rejected() {
            let err = check_phase_path([("a", Phase::InMatch), ("b", Phase::InMatch)])
                .unwrap_err();
            assert!(err.to_string().contains("'b'"));
        }

        #[test]
        fn test_terminal_enter_rejected() {
            let err = check_phase_path([("finish", Phase::Done)]).unwrap_err();
            assert!(err.to_string().contains("finish"));
        }
    }

    #[test]
    fn test_phase_serde_snake_case() {
        let phase: Phase = serde_yaml_ng::from_str("in_match").unwrap();
        assert_eq!(phase, Phase::InMatch);
        assert_eq!(
            serde_json::to_string(&Phase::WaitingForMenu).unwrap(),
            r#""waiting_for_menu""#
        );
    }
}
