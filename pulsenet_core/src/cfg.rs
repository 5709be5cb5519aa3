use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Per-unit numeric parameters supplied at construction time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnitCfg {
    /// Baseline firing threshold. The live threshold starts here.
    pub threshold: f64,
    /// Input weights; only `weights[0]` is applied to scalar input.
    pub weights: Vec<f64>,
    /// Size of the recent-history window consulted by adaptation.
    pub history_length: usize,
    pub refractory_offset: f64,
    /// Number of refractory-advancing cycles before the threshold is restored.
    pub refractory_events: u32,
    /// Potential retention per cycle, in (0, 1].
    pub decay_factor: f64,
    /// Passive decay is only logged when the potential moves by more than this.
    pub passive_decay_log_threshold: f64,
    /// Potential the unit resets to after firing.
    pub baseline_potential: f64,
    /// Threshold reduction applied after a silent window.
    pub silence_step: f64,
}

impl Default for UnitCfg {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            weights: vec![1.0],
            history_length: 5,
            refractory_offset: 0.5,
            refractory_events: 3,
            decay_factor: 0.9,
            passive_decay_log_threshold: 0.01,
            baseline_potential: 0.0,
            silence_step: 0.05,
        }
    }
}

impl UnitCfg {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_decay_factor(mut self, decay_factor: f64) -> Self {
        self.decay_factor = decay_factor;
        self
    }

    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_refractory(mut self, offset: f64, events: u32) -> Self {
        self.refractory_offset = offset;
        self.refractory_events = events;
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.weights.is_empty() {
            return Err(CoreError::InvalidConfig("weights must not be empty".into()));
        }
        if self.weights.iter().any(|w| !w.is_finite()) {
            return Err(CoreError::InvalidConfig("weights must be finite".into()));
        }
        if self.refractory_events == 0 {
            return Err(CoreError::InvalidConfig("refractory_events must be >= 1".into()));
        }
        if !(self.decay_factor > 0.0 && self.decay_factor <= 1.0) {
            return Err(CoreError::InvalidConfig(format!(
                "decay_factor must be in (0, 1], got {}",
                self.decay_factor
            )));
        }
        if self.history_length == 0 {
            return Err(CoreError::InvalidConfig("history_length must be >= 1".into()));
        }
        if !self.threshold.is_finite() || !self.baseline_potential.is_finite() {
            return Err(CoreError::InvalidConfig("threshold and baseline_potential must be finite".into()));
        }
        if !self.refractory_offset.is_finite() || self.refractory_offset < 0.0 {
            return Err(CoreError::InvalidConfig("refractory_offset must be finite and >= 0".into()));
        }
        Ok(())
    }
}

/// Trust dynamics for pattern recommendations and encounters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrustCfg {
    pub initial: f64,
    pub increment: f64,
    pub decrement: f64,
    pub debate_decrement: f64,
    /// Below this the unit challenges a recommendation.
    pub challenge_threshold: f64,
    /// Above this the unit adopts a recommendation outright.
    pub adopt_threshold: f64,
}

impl Default for TrustCfg {
    fn default() -> Self {
        Self {
            initial: 0.5,
            increment: 0.05,
            decrement: 0.05,
            debate_decrement: 0.01,
            challenge_threshold: 0.3,
            adopt_threshold: 0.8,
        }
    }
}

impl TrustCfg {
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, v) in [
            ("initial", self.initial),
            ("challenge_threshold", self.challenge_threshold),
            ("adopt_threshold", self.adopt_threshold),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(CoreError::InvalidConfig(format!("trust {name} must be in [0, 1], got {v}")));
            }
        }
        if self.challenge_threshold > self.adopt_threshold {
            return Err(CoreError::InvalidConfig(
                "challenge_threshold must not exceed adopt_threshold".into(),
            ));
        }
        Ok(())
    }
}

/// Fixed steps for supervisor-directed corrections and external feedback.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CorrectionCfg {
    pub refractory_offset_step: f64,
    pub refractory_offset_cap: f64,
    pub decay_factor_step: f64,
    pub decay_factor_floor: f64,
    pub dampening_step: f64,
    pub dampening_cap: f64,
    pub feedback_step: f64,
    pub feedback_floor: f64,
}

impl Default for CorrectionCfg {
    fn default() -> Self {
        Self {
            refractory_offset_step: 0.1,
            refractory_offset_cap: 1.0,
            decay_factor_step: 0.05,
            decay_factor_floor: 0.5,
            dampening_step: 0.1,
            dampening_cap: 2.0,
            feedback_step: 0.1,
            feedback_floor: 0.5,
        }
    }
}

impl CorrectionCfg {
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, v) in [
            ("refractory_offset_step", self.refractory_offset_step),
            ("decay_factor_step", self.decay_factor_step),
            ("dampening_step", self.dampening_step),
            ("feedback_step", self.feedback_step),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(CoreError::InvalidConfig(format!("{name} must be finite and >= 0, got {v}")));
            }
        }
        if !self.refractory_offset_cap.is_finite() || self.refractory_offset_cap < 0.0 {
            return Err(CoreError::InvalidConfig("refractory_offset_cap must be finite and >= 0".into()));
        }
        if !(self.decay_factor_floor > 0.0 && self.decay_factor_floor <= 1.0) {
            return Err(CoreError::InvalidConfig(format!(
                "decay_factor_floor must be in (0, 1], got {}",
                self.decay_factor_floor
            )));
        }
        if !self.dampening_cap.is_finite() || !self.feedback_floor.is_finite() {
            return Err(CoreError::InvalidConfig("dampening_cap and feedback_floor must be finite".into()));
        }
        Ok(())
    }
}
