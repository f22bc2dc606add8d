//! Resolver configuration stored as TOML (default `kinetic.toml`).

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::types::CandidateProfile;

/// Resolver configuration (TOML).
///
/// Intended to be edited by humans. Missing fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KineticConfig {
    /// Budget used when the caller does not supply one.
    pub default_budget: f64,

    /// Norms at or below this are treated as zero by the cosine drift model.
    pub zero_norm_threshold: f64,

    pub session: SessionConfig,

    /// Candidate profiles, in registration order.
    pub candidates: Vec<CandidateProfile>,
}

/// Session-wide control token: a global cap on any single mission's budget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub session_id: String,
    pub entropy_budget: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: "RUN_GENESIS_001".to_string(),
            entropy_budget: 0.05,
        }
    }
}

impl SessionConfig {
    /// Clamp a mission budget to the session cap.
    pub fn cap(&self, budget: f64) -> f64 {
        budget.min(self.entropy_budget)
    }
}

impl Default for KineticConfig {
    fn default() -> Self {
        Self {
            default_budget: 1.0,
            zero_norm_threshold: f64::MIN_POSITIVE,
            session: SessionConfig::default(),
            candidates: vec![
                CandidateProfile::new("aligned", vec![1.0, 1.0, 1.0]),
                CandidateProfile::new("skewed", vec![1.0, -1.0, 1.0]),
                CandidateProfile::new("inverted", vec![-1.0, -1.0, -1.0]),
            ],
        }
    }
}

impl KineticConfig {
    pub fn validate(&self) -> Result<()> {
        validate_budget("default_budget", self.default_budget)?;
        validate_budget("session.entropy_budget", self.session.entropy_budget)?;
        if !self.zero_norm_threshold.is_finite() || self.zero_norm_threshold <= 0.0 {
            return Err(anyhow!("zero_norm_threshold must be finite and > 0"));
        }
        if self.session.session_id.trim().is_empty() {
            return Err(anyhow!("session.session_id must be non-empty"));
        }

        let mut seen = HashSet::new();
        for (index, candidate) in self.candidates.iter().enumerate() {
            if candidate.id.trim().is_empty() {
                return Err(anyhow!("candidates[{}]: id must be non-empty", index));
            }
            if !seen.insert(candidate.id.as_str()) {
                return Err(anyhow!("duplicate candidate id '{}'", candidate.id));
            }
            if candidate.weights.is_empty() {
                return Err(anyhow!("candidate '{}': weights must be non-empty", candidate.id));
            }
            if candidate.weights.iter().any(|w| !w.is_finite()) {
                return Err(anyhow!("candidate '{}': weights must be finite", candidate.id));
            }
        }
        Ok(())
    }
}

fn validate_budget(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(anyhow!("{} must be finite and >= 0, got {}", name, value));
    }
    Ok(())
}

/// Read and validate `path`. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<KineticConfig> {
    let cfg = match fs::read_to_string(path) {
        Ok(contents) => toml::from_str::<KineticConfig>(&contents)
            .with_context(|| format!("parse {}", path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => KineticConfig::default(),
        Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
    };
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Persist a validated config, replacing `path` in one rename.
///
/// The binary only reads config; this is for embedders and test fixtures
/// (`test_support::TempConfig`) that seed a `kinetic.toml` for a run.
pub fn write_config(path: &Path, cfg: &KineticConfig) -> Result<()> {
    cfg.validate().context("refusing to write invalid config")?;
    let body = toml::to_string_pretty(cfg).context("serialize kinetic config")?;
    replace_file(path, &format!("{}\n", body.trim_end()))
}

fn replace_file(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("create directory {}", dir.display()))?;
    let staged = path.with_extension("toml.tmp");
    fs::write(&staged, contents).with_context(|| format!("stage {}", staged.display()))?;
    if let Err(err) = fs::rename(&staged, path) {
        let _ = fs::remove_file(&staged);
        return Err(err).with_context(|| format!("replace {}", path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, KineticConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("kinetic.toml");
        let cfg = KineticConfig::default();
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn write_replaces_existing_file_without_leftovers() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("kinetic.toml");
        fs::write(&path, "default_budget = 0.25\n").expect("seed");

        let cfg = KineticConfig {
            default_budget: 0.75,
            ..KineticConfig::default()
        };
        write_config(&path, &cfg).expect("write");

        assert_eq!(load_config(&path).expect("load").default_budget, 0.75);
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn write_refuses_invalid_config() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("kinetic.toml");
        let cfg = KineticConfig {
            default_budget: f64::NAN,
            ..KineticConfig::default()
        };
        let err = write_config(&path, &cfg).expect_err("invalid");
        assert!(err.to_string().contains("refusing to write invalid config"));
        assert!(!path.exists());
    }

    #[test]
    fn unparseable_file_names_the_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("kinetic.toml");
        fs::write(&path, "default_budget = [\n").expect("seed");
        let err = load_config(&path).expect_err("parse");
        assert!(format!("{:#}", err).contains("parse"));
        assert!(format!("{:#}", err).contains("kinetic.toml"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("kinetic.toml");
        fs::write(
            &path,
            "default_budget = 0.25\n\n[[candidates]]\nid = \"solo\"\nweights = [2.0, 0.5]\n",
        )
        .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.default_budget, 0.25);
        assert_eq!(cfg.candidates, vec![CandidateProfile::new("solo", vec![2.0, 0.5])]);
        assert_eq!(cfg.session, SessionConfig::default());
    }

    #[test]
    fn rejects_duplicate_candidate_ids() {
        let mut cfg = KineticConfig::default();
        cfg.candidates.push(CandidateProfile::new("aligned", vec![1.0]));
        let err = cfg.validate().expect_err("duplicate");
        assert!(err.to_string().contains("duplicate candidate id 'aligned'"));
    }

    #[test]
    fn rejects_negative_budget() {
        let cfg = KineticConfig {
            default_budget: -1.0,
            ..KineticConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_empty_weights() {
        let cfg = KineticConfig {
            candidates: vec![CandidateProfile::new("hollow", Vec::new())],
            ..KineticConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn session_caps_mission_budget() {
        let session = SessionConfig::default();
        assert_eq!(session.cap(0.04), 0.04);
        assert_eq!(session.cap(0.5), 0.05);
    }
}
