//! Candidate profile registry shared across concurrent resolutions.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::core::types::CandidateProfile;

/// Read-optimized store of candidate profiles keyed by id.
///
/// Profiles are replaced wholesale on re-registration and never mutated in
/// place. Lookups of unknown ids return [`CandidateProfile::unit`].
#[derive(Debug, Default)]
pub struct CandidateRegistry {
    profiles: RwLock<HashMap<String, CandidateProfile>>,
}

impl CandidateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from profiles; later duplicates replace earlier ones.
    pub fn from_profiles<I>(profiles: I) -> Self
    where
        I: IntoIterator<Item = CandidateProfile>,
    {
        let registry = Self::new();
        for profile in profiles {
            registry.register(profile);
        }
        registry
    }

    /// Insert or replace the profile for `profile.id`.
    pub fn register(&self, profile: CandidateProfile) {
        let mut profiles = self.profiles.write().unwrap_or_else(PoisonError::into_inner);
        let replaced = profiles.insert(profile.id.clone(), profile).is_some();
        debug!(replaced, "registered candidate profile");
    }

    /// Stored profile for `id`, or a unit profile if none was registered.
    pub fn lookup(&self, id: &str) -> CandidateProfile {
        let profiles = self.profiles.read().unwrap_or_else(PoisonError::into_inner);
        profiles
            .get(id)
            .cloned()
            .unwrap_or_else(|| CandidateProfile::unit(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        let profiles = self.profiles.read().unwrap_or_else(PoisonError::into_inner);
        profiles.contains_key(id)
    }

    /// Registered ids in lexicographic order.
    pub fn ids(&self) -> Vec<String> {
        let profiles = self.profiles.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = profiles.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.profiles.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
