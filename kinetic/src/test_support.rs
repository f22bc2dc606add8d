//! Test-only helpers for building registries, resolvers, and config files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use serde_json::{Value, json};

use crate::core::types::{CandidateProfile, TaskSpec};
use crate::io::config::{KineticConfig, write_config};
use crate::ledger::InMemoryLedger;
use crate::registry::CandidateRegistry;
use crate::resolver::{Handler, Resolver};

/// The three reference candidates: aligned, skewed, and inverted.
pub fn reference_profiles() -> Vec<CandidateProfile> {
    vec![
        CandidateProfile::new("aligned", vec![1.0, 1.0, 1.0]),
        CandidateProfile::new("skewed", vec![1.0, -1.0, 1.0]),
        CandidateProfile::new("inverted", vec![-1.0, -1.0, -1.0]),
    ]
}

/// Task with fixed intent and capability, and the given budget.
pub fn task(budget: f64) -> TaskSpec {
    TaskSpec::new("route", ["test"], budget).expect("valid test budget")
}

/// Handler returning `{"selected": id}`.
pub fn echo_handler(id: &str) -> impl Handler + 'static {
    let id = id.to_string();
    move |_task: &TaskSpec| -> Result<Value> { Ok(json!({ "selected": id })) }
}

/// Resolver over `profiles` with echo handlers registered in `order`.
pub fn resolver_with(
    profiles: Vec<CandidateProfile>,
    order: &[&str],
) -> (Resolver, Arc<InMemoryLedger>) {
    let registry = Arc::new(CandidateRegistry::from_profiles(profiles));
    let ledger = Arc::new(InMemoryLedger::new());
    let resolver = Resolver::new(registry, ledger.clone());
    for id in order {
        resolver.register_handler(*id, echo_handler(id));
    }
    (resolver, ledger)
}

/// Config file written into a temporary directory that lives as long as this value.
pub struct TempConfig {
    dir: tempfile::TempDir,
    path: PathBuf,
}

impl TempConfig {
    pub fn new(cfg: &KineticConfig) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("kinetic.toml");
        write_config(&path, cfg)?;
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}
