//! Budget-constrained handler resolution.
//!
//! The [`Resolver`] prices every registered candidate against the current
//! state, picks the cheapest one within the task's energy budget, records the
//! decision in the ledger, and invokes the chosen handler. Each call produces
//! exactly one ledger entry.

use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use crate::core::cost::{CosineDrift, CostModel};
use crate::core::selector::select_within_budget;
use crate::core::types::{DecisionRecord, TaskSpec, Verdict};
use crate::ledger::AuditLedger;
use crate::observer::{ResolutionEvent, ResolutionObserver, SilentObserver};
use crate::registry::CandidateRegistry;

/// Work performed once a candidate is chosen.
///
/// Failures are the handler's own; the resolver passes them through untouched.
pub trait Handler: Send + Sync {
    fn execute(&self, task: &TaskSpec) -> Result<Value>;
}

impl<F> Handler for F
where
    F: Fn(&TaskSpec) -> Result<Value> + Send + Sync,
{
    fn execute(&self, task: &TaskSpec) -> Result<Value> {
        self(task)
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    /// No candidate met the budget. Terminal for this attempt; never retried.
    #[error("{}", budget_message(.verdict, .budget, .lowest_cost))]
    BudgetExceeded {
        /// `Blocked` or `NoCandidates`.
        verdict: Verdict,
        budget: f64,
        lowest_cost: Option<f64>,
    },
    /// The chosen handler failed.
    #[error(transparent)]
    Handler(anyhow::Error),
}

fn budget_message(verdict: &Verdict, budget: &f64, lowest_cost: &Option<f64>) -> String {
    match (verdict, lowest_cost) {
        (Verdict::NoCandidates, _) => {
            format!("no candidates registered to meet energy budget {}", budget)
        }
        (_, Some(lowest)) => format!(
            "no candidate met energy budget {} (lowest cost {:.4})",
            budget, lowest
        ),
        (_, None) => format!("no candidate met energy budget {}", budget),
    }
}

struct Registration {
    id: String,
    handler: Arc<dyn Handler>,
}

/// Selects and invokes one handler per task.
///
/// Shareable across threads; the registry and ledger handle their own
/// synchronization.
pub struct Resolver {
    registry: Arc<CandidateRegistry>,
    ledger: Arc<dyn AuditLedger>,
    cost_model: Box<dyn CostModel>,
    observer: Arc<dyn ResolutionObserver>,
    handlers: RwLock<Vec<Registration>>,
}

impl Resolver {
    pub fn new(registry: Arc<CandidateRegistry>, ledger: Arc<dyn AuditLedger>) -> Self {
        Self {
            registry,
            ledger,
            cost_model: Box::new(CosineDrift::default()),
            observer: Arc::new(SilentObserver),
            handlers: RwLock::new(Vec::new()),
        }
    }

    pub fn with_cost_model(mut self, cost_model: impl CostModel + 'static) -> Self {
        self.cost_model = Box::new(cost_model);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ResolutionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Register an initial handler set, in iteration order.
    pub fn with_handlers<I, S>(self, handlers: I) -> Self
    where
        I: IntoIterator<Item = (S, Arc<dyn Handler>)>,
        S: Into<String>,
    {
        for (id, handler) in handlers {
            self.register_arc(id.into(), handler);
        }
        self
    }

    /// Register `handler` under `id`.
    ///
    /// Re-registering an id swaps the handler but keeps its original position
    /// in the tie-break order.
    pub fn register_handler(&self, id: impl Into<String>, handler: impl Handler + 'static) {
        self.register_arc(id.into(), Arc::new(handler));
    }

    fn register_arc(&self, id: String, handler: Arc<dyn Handler>) {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        match handlers.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => entry.handler = handler,
            None => handlers.push(Registration { id, handler }),
        }
    }

    /// Handler ids in registration order.
    pub fn candidate_ids(&self) -> Vec<String> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|entry| entry.id.clone())
            .collect()
    }

    pub fn registry(&self) -> &CandidateRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &dyn AuditLedger {
        self.ledger.as_ref()
    }

    /// Pick the cheapest candidate within budget, record it, and run it.
    ///
    /// The SUCCESS entry is written before the handler runs, so a handler that
    /// fails still leaves its decision in the ledger.
    #[instrument(skip_all, fields(intent = task.intent(), budget = task.energy_budget()))]
    pub fn resolve_and_execute(
        &self,
        task: &TaskSpec,
        state: &[f64],
    ) -> Result<Value, ResolveError> {
        // Snapshot so handlers registered mid-resolution don't affect this call.
        let candidates: Vec<(String, Arc<dyn Handler>)> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|entry| (entry.id.clone(), entry.handler.clone()))
            .collect();

        let budget = task.energy_budget();
        let priced: Vec<(usize, f64)> = candidates
            .iter()
            .enumerate()
            .map(|(index, (id, _))| {
                let profile = self.registry.lookup(id);
                let cost = self.cost_model.evaluate(&profile, state);
                self.observer.on_event(&ResolutionEvent::CandidateEvaluated {
                    intent: task.intent().to_string(),
                    candidate_id: id.clone(),
                    cost,
                    budget,
                    eligible: cost <= budget,
                });
                (index, cost)
            })
            .collect();

        let selection = select_within_budget(priced.iter().copied(), budget);

        let Some((chosen, chosen_cost)) = selection.chosen else {
            let verdict = if selection.evaluated == 0 {
                Verdict::NoCandidates
            } else {
                Verdict::Blocked
            };
            self.observer.on_event(&ResolutionEvent::ResolutionBlocked {
                intent: task.intent().to_string(),
                budget,
                evaluated: selection.evaluated,
                lowest_cost: selection.lowest_cost,
            });
            self.ledger.record(DecisionRecord {
                task: task.clone(),
                verdict,
                candidate_id: None,
                cost: selection.lowest_cost,
            });
            return Err(ResolveError::BudgetExceeded {
                verdict,
                budget,
                lowest_cost: selection.lowest_cost,
            });
        };

        let (chosen_id, handler) = &candidates[chosen];
        self.observer.on_event(&ResolutionEvent::CandidateSelected {
            intent: task.intent().to_string(),
            candidate_id: chosen_id.clone(),
            cost: chosen_cost,
        });
        self.ledger.record(DecisionRecord {
            task: task.clone(),
            verdict: Verdict::Success,
            candidate_id: Some(chosen_id.clone()),
            cost: Some(chosen_cost),
        });

        handler.execute(task).map_err(ResolveError::Handler)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::anyhow;
    use serde_json::json;

    use super::*;
    use crate::core::types::CandidateProfile;
    use crate::ledger::InMemoryLedger;
    use crate::observer::RecordingObserver;

    fn setup(profiles: &[(&str, &[f64])]) -> (Resolver, Arc<InMemoryLedger>) {
        let registry = Arc::new(CandidateRegistry::from_profiles(
            profiles
                .iter()
                .map(|(id, weights)| CandidateProfile::new(*id, weights.to_vec())),
        ));
        let ledger = Arc::new(InMemoryLedger::new());
        (Resolver::new(registry, ledger.clone()), ledger)
    }

    fn echo(id: &'static str) -> impl Handler {
        move |_task: &TaskSpec| -> Result<Value> { Ok(json!({ "selected": id })) }
    }

    fn task(budget: f64) -> TaskSpec {
        TaskSpec::new("route", ["test"], budget).expect("task")
    }

    #[test]
    fn no_candidates_records_distinct_verdict() {
        let (resolver, ledger) = setup(&[]);
        let err = resolver
            .resolve_and_execute(&task(1.0), &[1.0, 2.0, 3.0])
            .expect_err("no candidates");
        assert!(matches!(
            err,
            ResolveError::BudgetExceeded {
                verdict: Verdict::NoCandidates,
                lowest_cost: None,
                ..
            }
        ));
        let entries = ledger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].verdict, Verdict::NoCandidates);
        assert_eq!(entries[0].cost, None);
    }

    #[test]
    fn blocked_records_lowest_observed_cost() {
        let (resolver, ledger) = setup(&[
            ("skewed", &[1.0, -1.0, 1.0]),
            ("inverted", &[-1.0, -1.0, -1.0]),
        ]);
        resolver.register_handler("inverted", echo("inverted"));
        resolver.register_handler("skewed", echo("skewed"));

        let err = resolver
            .resolve_and_execute(&task(0.1), &[1.0, 2.0, 3.0])
            .expect_err("blocked");
        assert!(err.to_string().contains("no candidate met energy budget 0.1"));

        let last = ledger.last().expect("entry");
        assert_eq!(last.verdict, Verdict::Blocked);
        assert_eq!(last.candidate_id, None);
        let lowest = last.cost.expect("lowest cost");
        assert!((lowest - (1.0 - 6.0 / 14.0)).abs() < 1e-12);
    }

    #[test]
    fn handler_error_propagates_after_success_entry() {
        let (resolver, ledger) = setup(&[("aligned", &[1.0, 1.0])]);
        resolver.register_handler("aligned", |_task: &TaskSpec| -> Result<Value> {
            Err(anyhow!("handler exploded"))
        });

        let err = resolver
            .resolve_and_execute(&task(1.0), &[3.0, 4.0])
            .expect_err("handler failure");
        assert!(matches!(err, ResolveError::Handler(_)));
        assert_eq!(err.to_string(), "handler exploded");

        let entries = ledger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].verdict, Verdict::Success);
        assert_eq!(entries[0].candidate_id.as_deref(), Some("aligned"));
    }

    #[test]
    fn reregistering_keeps_original_position() {
        let (resolver, _ledger) = setup(&[("a", &[1.0]), ("b", &[1.0])]);
        resolver.register_handler("a", echo("a"));
        resolver.register_handler("b", echo("b"));
        resolver.register_handler("a", echo("a2"));
        assert_eq!(resolver.candidate_ids(), vec!["a", "b"]);

        // Equal cost: the first registered id wins, running its newest handler.
        let result = resolver.resolve_and_execute(&task(1.0), &[2.0]).expect("resolve");
        assert_eq!(result, json!({ "selected": "a2" }));
    }

    #[test]
    fn unknown_profile_degrades_to_noop_projection() {
        let (resolver, ledger) = setup(&[]);
        resolver.register_handler("unprofiled", echo("unprofiled"));
        resolver
            .resolve_and_execute(&task(0.0), &[1.0, 2.0, 3.0])
            .expect("no-op projection costs zero");
        assert_eq!(ledger.last().and_then(|r| r.cost), Some(0.0));
    }

    #[test]
    fn observer_sees_each_step_in_order() {
        let (resolver, _ledger) =
            setup(&[("aligned", &[1.0, 1.0]), ("inverted", &[-1.0, -1.0])]);
        let observer = Arc::new(RecordingObserver::new());
        let resolver = resolver.with_observer(observer.clone());
        resolver.register_handler("inverted", echo("inverted"));
        resolver.register_handler("aligned", echo("aligned"));

        resolver.resolve_and_execute(&task(0.5), &[1.0, 1.0]).expect("resolve");

        let events = observer.events();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[0],
            ResolutionEvent::CandidateEvaluated { candidate_id, eligible: false, .. }
                if candidate_id == "inverted"
        ));
        assert!(matches!(
            &events[1],
            ResolutionEvent::CandidateEvaluated { candidate_id, eligible: true, .. }
                if candidate_id == "aligned"
        ));
        assert!(matches!(
            &events[2],
            ResolutionEvent::CandidateSelected { candidate_id, .. } if candidate_id == "aligned"
        ));
    }

    #[test]
    fn custom_cost_model_replaces_cosine_drift() {
        struct ByWeightSum;
        impl CostModel for ByWeightSum {
            fn evaluate(&self, profile: &CandidateProfile, _state: &[f64]) -> f64 {
                profile.weights.iter().sum()
            }
        }

        let (resolver, ledger) = setup(&[("heavy", &[0.9]), ("light", &[0.2])]);
        let resolver = resolver.with_cost_model(ByWeightSum);
        resolver.register_handler("heavy", echo("heavy"));
        resolver.register_handler("light", echo("light"));

        let result = resolver.resolve_and_execute(&task(0.5), &[]).expect("resolve");
        assert_eq!(result, json!({ "selected": "light" }));
        assert_eq!(ledger.last().and_then(|r| r.cost), Some(0.2));
    }

    #[test]
    fn handler_receives_the_task() {
        let (resolver, _ledger) = setup(&[("a", &[1.0])]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        resolver.register_handler("a", move |task: &TaskSpec| -> Result<Value> {
            sink.lock().expect("lock").push(task.intent().to_string());
            Ok(Value::Null)
        });
        resolver.resolve_and_execute(&task(1.0), &[1.0]).expect("resolve");
        assert_eq!(*seen.lock().expect("lock"), vec!["route".to_string()]);
    }
}
