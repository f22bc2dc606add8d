//! Closed set of lifecycle phases and the allowed-successor table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One stage of the fixed pipeline a task run passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Idle,
    Planning,
    ToolRouting,
    Executing,
    Validating,
    Completed,
    Failed,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Idle,
        Phase::Planning,
        Phase::ToolRouting,
        Phase::Executing,
        Phase::Validating,
        Phase::Completed,
        Phase::Failed,
    ];

    /// Phases reachable from `self` in one transition.
    pub fn allowed_targets(self) -> &'static [Phase] {
        match self {
            Phase::Idle => &[Phase::Planning, Phase::Failed],
            Phase::Planning => &[Phase::ToolRouting, Phase::Failed],
            Phase::ToolRouting => &[Phase::Executing, Phase::Failed],
            Phase::Executing => &[Phase::Validating, Phase::Failed],
            Phase::Validating => &[Phase::Completed, Phase::Failed],
            Phase::Completed | Phase::Failed => &[],
        }
    }

    pub fn can_transition_to(self, target: Phase) -> bool {
        self.allowed_targets().contains(&target)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_targets().is_empty()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "IDLE",
            Phase::Planning => "PLANNING",
            Phase::ToolRouting => "TOOL_ROUTING",
            Phase::Executing => "EXECUTING",
            Phase::Validating => "VALIDATING",
            Phase::Completed => "COMPLETED",
            Phase::Failed => "FAILED",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        Phase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == wanted)
            .ok_or_else(|| format!("unknown phase '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_completed_and_failed_are_terminal() {
        let terminal: Vec<Phase> = Phase::ALL.into_iter().filter(|p| p.is_terminal()).collect();
        assert_eq!(terminal, vec![Phase::Completed, Phase::Failed]);
    }

    #[test]
    fn every_non_terminal_phase_can_fail() {
        for phase in Phase::ALL.into_iter().filter(|p| !p.is_terminal()) {
            assert!(phase.can_transition_to(Phase::Failed), "{phase} -> FAILED");
        }
    }

    #[test]
    fn no_phase_can_return_to_idle() {
        for phase in Phase::ALL {
            assert!(!phase.can_transition_to(Phase::Idle), "{phase} -> IDLE");
        }
    }

    #[test]
    fn parses_display_names() {
        for phase in Phase::ALL {
            assert_eq!(phase.as_str().parse::<Phase>(), Ok(phase));
        }
        assert_eq!("tool-routing".parse::<Phase>(), Ok(Phase::ToolRouting));
        assert!("RUNNING".parse::<Phase>().is_err());
    }
}
