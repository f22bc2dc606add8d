//! Shared deterministic types for the resolution core.
//!
//! These types define stable contracts between the registry, the cost model,
//! the resolver, and the ledger. They hold no I/O handles and serialize with
//! serde so external tooling can consume them as JSON.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordered state vector describing the current task/system state.
pub type StateVector = Vec<f64>;

/// Errors raised while constructing a [`TaskSpec`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskSpecError {
    #[error("energy budget must be finite, got {0}")]
    NonFiniteBudget(f64),
    #[error("energy budget must be non-negative, got {0}")]
    NegativeBudget(f64),
}

/// A unit of work to route to exactly one handler.
///
/// Fields are private so a constructed task cannot be mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSpec {
    intent: String,
    required_capabilities: BTreeSet<String>,
    energy_budget: f64,
}

impl TaskSpec {
    pub fn new<I, S>(
        intent: impl Into<String>,
        required_capabilities: I,
        energy_budget: f64,
    ) -> Result<Self, TaskSpecError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !energy_budget.is_finite() {
            return Err(TaskSpecError::NonFiniteBudget(energy_budget));
        }
        if energy_budget < 0.0 {
            return Err(TaskSpecError::NegativeBudget(energy_budget));
        }
        Ok(Self {
            intent: intent.into(),
            required_capabilities: required_capabilities.into_iter().map(Into::into).collect(),
            energy_budget,
        })
    }

    pub fn intent(&self) -> &str {
        &self.intent
    }

    /// Capability tags. Informational only; selection never reads them.
    pub fn required_capabilities(&self) -> &BTreeSet<String> {
        &self.required_capabilities
    }

    /// Upper bound on acceptable cost.
    pub fn energy_budget(&self) -> f64 {
        self.energy_budget
    }
}

/// Numeric profile used to estimate a candidate's cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: String,
    pub weights: Vec<f64>,
}

impl CandidateProfile {
    pub fn new(id: impl Into<String>, weights: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            weights,
        }
    }

    /// Profile handed out for ids the registry has never seen.
    ///
    /// A single unit weight only matches one-dimensional states, so for any
    /// other state the projection is a no-op.
    pub fn unit(id: impl Into<String>) -> Self {
        Self::new(id, vec![1.0])
    }
}

/// Outcome of a single resolution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// An eligible candidate was chosen and its handler invoked.
    Success,
    /// Candidates were evaluated but none met the budget.
    Blocked,
    /// No candidates were registered at all.
    NoCandidates,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Success => "SUCCESS",
            Verdict::Blocked => "BLOCKED",
            Verdict::NoCandidates => "NO_CANDIDATES",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable ledger entry describing one resolution decision.
///
/// `candidate_id` is set only for [`Verdict::Success`]. `cost` is the chosen
/// cost on success, the lowest observed cost when blocked, and absent when no
/// candidates existed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionRecord {
    pub task: TaskSpec,
    pub verdict: Verdict,
    pub candidate_id: Option<String>,
    pub cost: Option<f64>,
}
