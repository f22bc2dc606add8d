//! Cost estimation: project a state through a candidate profile and measure
//! how far the projection drifts from the original.
//!
//! Everything here is pure. Identical inputs always produce bit-identical
//! outputs.

use crate::core::types::CandidateProfile;

/// Cost returned for degenerate inputs (empty, mismatched, or near-zero norm).
///
/// Sits in the middle of the cosine range so malformed input can never look
/// cheaper than a genuinely aligned candidate.
pub const FALLBACK_COST: f64 = 1.0;

/// Strategy for pricing a candidate against the current state.
pub trait CostModel: Send + Sync {
    fn evaluate(&self, profile: &CandidateProfile, state: &[f64]) -> f64;
}

/// Cosine drift: `1 - cos(state, project(profile, state))`, within `[0, 2]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CosineDrift {
    /// Norms at or below this value are treated as zero.
    pub zero_norm_threshold: f64,
}

impl Default for CosineDrift {
    fn default() -> Self {
        Self {
            zero_norm_threshold: f64::MIN_POSITIVE,
        }
    }
}

impl CosineDrift {
    pub fn new(zero_norm_threshold: f64) -> Self {
        Self {
            zero_norm_threshold,
        }
    }
}

impl CostModel for CosineDrift {
    fn evaluate(&self, profile: &CandidateProfile, state: &[f64]) -> f64 {
        let projected = project(profile, state);
        drift_cost(state, &projected, self.zero_norm_threshold)
    }
}

/// Elementwise product of `state` and the profile weights.
///
/// A profile whose length differs from the state leaves the state unchanged.
pub fn project(profile: &CandidateProfile, state: &[f64]) -> Vec<f64> {
    if profile.weights.len() != state.len() {
        return state.to_vec();
    }
    state
        .iter()
        .zip(&profile.weights)
        .map(|(value, weight)| value * weight)
        .collect()
}

/// `1 - cosine_similarity(state, projected)` using the default threshold.
pub fn cost(state: &[f64], projected: &[f64]) -> f64 {
    drift_cost(state, projected, f64::MIN_POSITIVE)
}

/// `1 - cosine_similarity(state, projected)` with an explicit zero-norm threshold.
pub fn drift_cost(state: &[f64], projected: &[f64], zero_norm_threshold: f64) -> f64 {
    if state.is_empty() || state.len() != projected.len() {
        return FALLBACK_COST;
    }

    let (Some(a), Some(b)) = (Scaled::new(state), Scaled::new(projected)) else {
        return FALLBACK_COST;
    };
    if a.norm() <= zero_norm_threshold || b.norm() <= zero_norm_threshold {
        return FALLBACK_COST;
    }

    // Components are scaled into [-1, 1] so neither the squares nor the dot
    // product under/overflow. sqrt(x * x) == x in IEEE arithmetic, which keeps
    // cost(v, v) at exactly zero.
    let dot: f64 = a.unit.iter().zip(&b.unit).map(|(x, y)| x * y).sum();
    let cosine = dot / (a.sum_sq * b.sum_sq).sqrt();
    if !cosine.is_finite() {
        return FALLBACK_COST;
    }
    1.0 - cosine.clamp(-1.0, 1.0)
}

/// Vector rescaled by its largest absolute component.
struct Scaled {
    scale: f64,
    unit: Vec<f64>,
    sum_sq: f64,
}

impl Scaled {
    /// Returns `None` for non-finite input.
    fn new(values: &[f64]) -> Option<Self> {
        let scale = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if !scale.is_finite() || values.iter().any(|v| v.is_nan()) {
            return None;
        }
        if scale == 0.0 {
            return Some(Self {
                scale,
                unit: vec![0.0; values.len()],
                sum_sq: 0.0,
            });
        }
        let unit: Vec<f64> = values.iter().map(|v| v / scale).collect();
        let sum_sq = unit.iter().map(|v| v * v).sum();
        Some(Self {
            scale,
            unit,
            sum_sq,
        })
    }

    fn norm(&self) -> f64 {
        self.scale * self.sum_sq.sqrt()
    }
}
