//! Command-line front end for budget-constrained handler resolution.
//!
//! Loads candidate profiles from `kinetic.toml`, registers an echo handler per
//! candidate, and drives a lifecycle run around each resolution.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{Value, json};

use kinetic::exit_codes;
use kinetic::io::config::{KineticConfig, load_config};
use kinetic::logging;
use kinetic::{
    AuditLedger, CandidateRegistry, CosineDrift, DecisionRecord, InMemoryLedger, Orchestrator,
    Phase, PromptEnvelope, ResolveError, Resolver, TaskSpec, TracingObserver, TransitionRecord,
    build_prompt,
};

#[derive(Parser)]
#[command(
    name = "kinetic",
    version,
    about = "Budget-constrained handler resolution with a validated task lifecycle"
)]
struct Cli {
    /// Path to the TOML config. Defaults apply when the file is missing.
    #[arg(long, global = true, default_value = "kinetic.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pick the cheapest configured candidate within budget and run it.
    Resolve {
        /// Comma-separated state vector, e.g. `1,2,3`.
        #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
        state: Vec<f64>,
        /// Energy budget. Defaults to `default_budget` from the config.
        #[arg(long)]
        budget: Option<f64>,
        #[arg(long, default_value = "ad-hoc task")]
        intent: String,
        /// Required capability tag (repeatable, informational only).
        #[arg(long = "capability")]
        capabilities: Vec<String>,
    },
    /// Run IDLE through COMPLETED and print the transition history.
    Lifecycle {
        /// Fail the run once this phase is reached instead of completing.
        /// COMPLETED and FAILED are rejected.
        #[arg(long)]
        fail_at: Option<Phase>,
    },
    /// Render a layered prompt.
    Prompt {
        #[arg(long)]
        base: String,
        #[arg(long)]
        task: String,
        /// Context entry as `key=value` (repeatable).
        #[arg(long = "context", value_parser = parse_key_value)]
        context: Vec<(String, String)>,
    },
    /// Route the two genesis missions under the configured session budget.
    Ignite {
        #[arg(long, value_delimiter = ',', default_value = "1,2,3", allow_hyphen_values = true)]
        state: Vec<f64>,
    },
}

/// JSON report printed by `kinetic resolve`.
#[derive(Serialize)]
struct ResolveReport {
    phase: Phase,
    result: Option<Value>,
    error: Option<String>,
    ledger: Vec<DecisionRecord>,
    history: Vec<TransitionRecord>,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Resolve {
            state,
            budget,
            intent,
            capabilities,
        } => {
            let cfg = load_config(&cli.config)?;
            let budget = budget.unwrap_or(cfg.default_budget);
            cmd_resolve(&cfg, intent, capabilities, budget, &state)
        }
        Command::Lifecycle { fail_at } => cmd_lifecycle(fail_at),
        Command::Prompt {
            base,
            task,
            context,
        } => cmd_prompt(base, task, context),
        Command::Ignite { state } => {
            let cfg = load_config(&cli.config)?;
            cmd_ignite(&cfg, &state)
        }
    }
}

fn build_resolver(cfg: &KineticConfig, ledger: Arc<InMemoryLedger>) -> Resolver {
    let registry = Arc::new(CandidateRegistry::from_profiles(cfg.candidates.clone()));
    let resolver = Resolver::new(registry, ledger)
        .with_cost_model(CosineDrift::new(cfg.zero_norm_threshold))
        .with_observer(Arc::new(TracingObserver));
    for candidate in &cfg.candidates {
        let id = candidate.id.clone();
        resolver.register_handler(candidate.id.clone(), move |task: &TaskSpec| -> Result<Value> {
            Ok(json!({ "candidate": id, "intent": task.intent() }))
        });
    }
    resolver
}

fn cmd_resolve(
    cfg: &KineticConfig,
    intent: String,
    capabilities: Vec<String>,
    budget: f64,
    state: &[f64],
) -> Result<i32> {
    let task = TaskSpec::new(intent, capabilities, budget).context("build task")?;
    let ledger = Arc::new(InMemoryLedger::new());
    let resolver = build_resolver(cfg, ledger.clone());

    let mut run = Orchestrator::new();
    run.transition(Phase::Planning, "task accepted")?;
    run.transition(Phase::ToolRouting, "resolving handler")?;

    let (code, result, error) = match resolver.resolve_and_execute(&task, state) {
        Ok(result) => {
            run.transition(Phase::Executing, "handler executed")?;
            run.transition(Phase::Validating, "result checks")?;
            run.transition(Phase::Completed, "validation passed")?;
            (exit_codes::OK, Some(result), None)
        }
        Err(err @ ResolveError::BudgetExceeded { .. }) => {
            run.fail(err.to_string())?;
            (exit_codes::BLOCKED, None, Some(err.to_string()))
        }
        Err(ResolveError::Handler(err)) => {
            run.fail(format!("handler failed: {:#}", err))?;
            (exit_codes::HANDLER_FAILED, None, Some(format!("{:#}", err)))
        }
    };

    let report = ResolveReport {
        phase: run.phase(),
        result,
        error,
        ledger: ledger.entries(),
        history: run.history().to_vec(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serialize resolve report")?
    );
    Ok(code)
}

fn cmd_lifecycle(fail_at: Option<Phase>) -> Result<i32> {
    let mut run = Orchestrator::new();
    match fail_at {
        None => {
            run.run_happy_path()?;
        }
        Some(stop) => {
            if stop.is_terminal() {
                bail!("--fail-at must name a non-terminal phase, got {}", stop);
            }
            let pipeline = [
                Phase::Planning,
                Phase::ToolRouting,
                Phase::Executing,
                Phase::Validating,
                Phase::Completed,
            ];
            for next in pipeline {
                if run.phase() == stop {
                    break;
                }
                run.transition(next, "advance")?;
            }
            run.fail(format!("failed at {}", stop))?;
        }
    }
    for record in run.history() {
        println!("{}", record);
    }
    Ok(exit_codes::OK)
}

fn cmd_prompt(base: String, task: String, context: Vec<(String, String)>) -> Result<i32> {
    let mut envelope = PromptEnvelope::new(base, task);
    for (key, value) in context {
        envelope = envelope.with_context(key, value);
    }
    println!("{}", build_prompt(&envelope)?);
    Ok(exit_codes::OK)
}

fn cmd_ignite(cfg: &KineticConfig, state: &[f64]) -> Result<i32> {
    let session = &cfg.session;
    println!(
        "session {}: global budget {}",
        session.session_id, session.entropy_budget
    );

    let missions = [
        (
            "Generate visual overlay for Sector 7",
            ["nano_banana", "visual_coherence"],
            0.04,
        ),
        (
            "Simulate chaotic weather remix",
            ["veo", "particle_physics"],
            0.01,
        ),
    ];

    let ledger = Arc::new(InMemoryLedger::new());
    let resolver = build_resolver(cfg, ledger.clone());
    for (intent, capabilities, budget) in missions {
        let task = TaskSpec::new(intent, capabilities, session.cap(budget))?;
        match resolver.resolve_and_execute(&task, state) {
            Ok(_) | Err(ResolveError::BudgetExceeded { .. }) => {}
            Err(err @ ResolveError::Handler(_)) => return Err(err.into()),
        }
    }

    for record in ledger.entries() {
        let candidate = record.candidate_id.as_deref().unwrap_or("-");
        let cost = record
            .cost
            .map(|c| format!("{:.4}", c))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}: {} {} (cost {}, budget {})",
            record.task.intent(),
            record.verdict,
            candidate,
            cost,
            record.task.energy_budget()
        );
    }
    Ok(exit_codes::OK)
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}
