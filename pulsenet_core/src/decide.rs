use serde::{Deserialize, Serialize};

/// Outcome of the firing decision for one processed input.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum FireDecision {
    Fire,
    Hold,
}

#[inline]
pub fn decide_fire(potential: f64, threshold: f64) -> FireDecision {
    if potential >= threshold {
        FireDecision::Fire
    } else {
        FireDecision::Hold
    }
}

/// Leaky integration: `potential * decay + input * weight`.
#[inline]
pub fn integrate(potential: f64, decay_factor: f64, input: f64, weight: f64) -> f64 {
    potential * decay_factor + input * weight
}

/// Threshold after a silent window: one step down, never below baseline.
#[inline]
pub fn lowered_threshold(threshold: f64, baseline: f64, step: f64) -> f64 {
    baseline.max(threshold - step)
}

/// Source-tagged external feedback on a unit's firing.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Feedback {
    Positive,
    Negative,
    Neutral,
}
