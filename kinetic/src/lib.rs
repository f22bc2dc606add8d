//! Budget-constrained handler resolution and task lifecycle tracking.
//!
//! Two independent subsystems that compose only through the caller:
//!
//! - **[`resolver`]**: prices every registered candidate against the current
//!   state vector, picks the cheapest one within the task's energy budget,
//!   records the decision in an append-only [`ledger`], and invokes its handler.
//! - **[`orchestrator`]**: validates the phase sequence of one task run and
//!   renders the layered [`prompt`] handed to the execution step.
//!
//! **[`core`]** holds the pure, deterministic pieces (cost model, selection,
//! phase table, shared types). **[`io`]** holds config loading for the binary.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod ledger;
pub mod logging;
pub mod observer;
pub mod orchestrator;
pub mod prompt;
pub mod registry;
pub mod resolver;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crate::core::cost::{CosineDrift, CostModel, FALLBACK_COST, cost, project};
pub use crate::core::phase::Phase;
pub use crate::core::types::{
    CandidateProfile, DecisionRecord, StateVector, TaskSpec, TaskSpecError, Verdict,
};
pub use crate::ledger::{AuditLedger, InMemoryLedger};
pub use crate::observer::{
    RecordingObserver, ResolutionEvent, ResolutionObserver, SilentObserver, TracingObserver,
};
pub use crate::orchestrator::{InvalidTransition, Orchestrator, TransitionRecord};
pub use crate::prompt::{PromptEnvelope, build_prompt};
pub use crate::registry::CandidateRegistry;
pub use crate::resolver::{Handler, ResolveError, Resolver};
