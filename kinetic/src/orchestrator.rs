//! Lifecycle state machine for a single task run.
//!
//! An [`Orchestrator`] walks one run through the fixed phase pipeline and
//! keeps an ordered transition history. It is not synchronized: one instance
//! per run, and `transition` takes `&mut self`.

use std::fmt;

use anyhow::Result;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::core::phase::Phase;
use crate::prompt::{PromptEnvelope, build_prompt};

/// Reasons recorded by [`Orchestrator::run_happy_path`], in order.
const HAPPY_PATH: [(Phase, &str); 5] = [
    (Phase::Planning, "task accepted"),
    (Phase::ToolRouting, "tools selected"),
    (Phase::Executing, "execution started"),
    (Phase::Validating, "result checks"),
    (Phase::Completed, "validation passed"),
];

/// One accepted phase change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    pub from: Phase,
    pub to: Phase,
    pub reason: String,
}

impl fmt::Display for TransitionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.from, self.to, self.reason)
    }
}

/// A transition the current phase does not allow. Indicates a sequencing bug
/// in the caller; retrying cannot succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {from} -> {to} (allowed: [{}])", join_phases(.allowed))]
pub struct InvalidTransition {
    pub from: Phase,
    pub to: Phase,
    /// Allowed targets from `from`, sorted by name.
    pub allowed: Vec<Phase>,
}

fn join_phases(phases: &[Phase]) -> String {
    phases
        .iter()
        .map(|phase| phase.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orchestrator {
    phase: Phase,
    history: Vec<TransitionRecord>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            history: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Accepted transitions, oldest first.
    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    /// Move to `target` if the current phase allows it.
    pub fn transition(
        &mut self,
        target: Phase,
        reason: impl Into<String>,
    ) -> Result<(), InvalidTransition> {
        let from = self.phase;
        if !from.can_transition_to(target) {
            let mut allowed = from.allowed_targets().to_vec();
            allowed.sort_by_key(|phase| phase.as_str());
            return Err(InvalidTransition {
                from,
                to: target,
                allowed,
            });
        }

        let reason = reason.into();
        debug!(%from, to = %target, %reason, "phase transition");
        self.history.push(TransitionRecord {
            from,
            to: target,
            reason,
        });
        self.phase = target;
        Ok(())
    }

    /// Shorthand for `transition(Phase::Failed, reason)`.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), InvalidTransition> {
        self.transition(Phase::Failed, reason)
    }

    /// Drive IDLE through COMPLETED in five transitions.
    pub fn run_happy_path(&mut self) -> Result<Phase, InvalidTransition> {
        for (target, reason) in HAPPY_PATH {
            self.transition(target, reason)?;
        }
        Ok(self.phase)
    }

    /// Render the layered prompt. Does not touch the phase or history.
    pub fn build_prompt(&self, envelope: &PromptEnvelope) -> Result<String> {
        build_prompt(envelope)
    }
}
