//! Structured resolution events delivered to an injected observer.
//!
//! The resolver never prints. Embedders that want a trace of each decision
//! step install an observer; the default one discards everything.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

/// One step of a resolution, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ResolutionEvent {
    CandidateEvaluated {
        intent: String,
        candidate_id: String,
        cost: f64,
        budget: f64,
        eligible: bool,
    },
    CandidateSelected {
        intent: String,
        candidate_id: String,
        cost: f64,
    },
    ResolutionBlocked {
        intent: String,
        budget: f64,
        evaluated: usize,
        lowest_cost: Option<f64>,
    },
}

pub trait ResolutionObserver: Send + Sync {
    fn on_event(&self, event: &ResolutionEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl ResolutionObserver for SilentObserver {
    fn on_event(&self, _event: &ResolutionEvent) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ResolutionObserver for TracingObserver {
    fn on_event(&self, event: &ResolutionEvent) {
        match event {
            ResolutionEvent::CandidateEvaluated {
                intent,
                candidate_id,
                cost,
                budget,
                eligible,
            } => debug!(%intent, %candidate_id, cost, budget, eligible, "candidate evaluated"),
            ResolutionEvent::CandidateSelected {
                intent,
                candidate_id,
                cost,
            } => info!(%intent, %candidate_id, cost, "candidate selected"),
            ResolutionEvent::ResolutionBlocked {
                intent,
                budget,
                evaluated,
                lowest_cost,
            } => warn!(%intent, budget, evaluated, ?lowest_cost, "no candidate within budget"),
        }
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ResolutionEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ResolutionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ResolutionObserver for RecordingObserver {
    fn on_event(&self, event: &ResolutionEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
