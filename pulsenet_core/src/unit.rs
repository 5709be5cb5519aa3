//! The unit: integrate, decay, fire, refractory, adapt.
//!
//! A unit owns all of its numeric state. Supervisors reach it only through
//! the corrective entry points (`receive_boundary_notification`,
//! `adapt_parameters`) and the pattern-facing operations; none of those hold a
//! reference back to the caller.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::bounds::{Parameter, SafeBound};
use crate::cfg::{CorrectionCfg, TrustCfg, UnitCfg};
use crate::decide::{decide_fire, integrate, lowered_threshold, Feedback, FireDecision};
use crate::error::CoreError;
use crate::history::{FiringHistory, FiringRecord};
use crate::ids::{SupervisorId, UnitId};
use crate::pattern::AdoptionStatus;
use crate::state::RefractoryState;

/// Corrective group adjustments requested by a supervisor.
///
/// Each flag is independent; any combination may be applied at once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub increase_refractory_offset: bool,
    pub decrease_decay_factor: bool,
    pub network_dampening: bool,
}

impl Correction {
    /// The correction applied to every rapidly firing unit.
    pub const RAPID_FIRING: Correction = Correction {
        increase_refractory_offset: true,
        decrease_decay_factor: true,
        network_dampening: false,
    };

    /// The extra correction applied when more than one unit is flagged.
    pub const NETWORK_DAMPENING: Correction = Correction {
        increase_refractory_offset: false,
        decrease_decay_factor: false,
        network_dampening: true,
    };
}

#[derive(Clone, Debug)]
pub struct Unit {
    id: UnitId,
    cfg: UnitCfg,
    trust_cfg: TrustCfg,
    correction_cfg: CorrectionCfg,

    potential: f64,
    threshold: f64,
    baseline_threshold: f64,
    decay_factor: f64,
    refractory_offset: f64,
    refractory: RefractoryState,
    history: FiringHistory,

    trust_score: f64,
    patterns_monitored: BTreeSet<String>,
    patterns_adopted: BTreeSet<String>,

    asleep: bool,
    last_input_received: bool,
}

impl Unit {
    /// Create a unit with a fresh random id.
    pub fn new(cfg: UnitCfg) -> Result<Self, CoreError> {
        Self::with_id(UnitId::new(), cfg)
    }

    pub fn with_id(id: UnitId, cfg: UnitCfg) -> Result<Self, CoreError> {
        Self::with_cfgs(id, cfg, TrustCfg::default(), CorrectionCfg::default())
    }

    /// Full constructor. Fails fast on malformed configuration.
    pub fn with_cfgs(
        id: UnitId,
        cfg: UnitCfg,
        trust_cfg: TrustCfg,
        correction_cfg: CorrectionCfg,
    ) -> Result<Self, CoreError> {
        cfg.validate()?;
        trust_cfg.validate()?;
        correction_cfg.validate()?;

        let unit = Self {
            id,
            potential: cfg.baseline_potential,
            threshold: cfg.threshold,
            baseline_threshold: cfg.threshold,
            decay_factor: cfg.decay_factor,
            refractory_offset: cfg.refractory_offset,
            refractory: RefractoryState::default(),
            history: FiringHistory::new(),
            trust_score: trust_cfg.initial,
            patterns_monitored: BTreeSet::new(),
            patterns_adopted: BTreeSet::new(),
            asleep: false,
            last_input_received: false,
            cfg,
            trust_cfg,
            correction_cfg,
        };
        info!(
            event = "unit_created",
            unit = %unit.id,
            threshold = unit.baseline_threshold,
            refractory_offset = unit.refractory_offset,
            decay_factor = unit.decay_factor,
            "unit created"
        );
        Ok(unit)
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn potential(&self) -> f64 {
        self.potential
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn baseline_threshold(&self) -> f64 {
        self.baseline_threshold
    }

    pub fn decay_factor(&self) -> f64 {
        self.decay_factor
    }

    pub fn refractory_offset(&self) -> f64 {
        self.refractory_offset
    }

    pub fn refractory_events(&self) -> u32 {
        self.cfg.refractory_events
    }

    pub fn refractory_counter(&self) -> u32 {
        self.refractory.counter
    }

    pub fn in_refractory(&self) -> bool {
        self.refractory.active
    }

    pub fn weights(&self) -> &[f64] {
        &self.cfg.weights
    }

    pub fn history(&self) -> &FiringHistory {
        &self.history
    }

    pub fn history_length(&self) -> usize {
        self.cfg.history_length
    }

    pub fn trust_score(&self) -> f64 {
        self.trust_score
    }

    pub fn patterns_monitored(&self) -> &BTreeSet<String> {
        &self.patterns_monitored
    }

    pub fn patterns_adopted(&self) -> &BTreeSet<String> {
        &self.patterns_adopted
    }

    pub fn is_asleep(&self) -> bool {
        self.asleep
    }

    /// Current value of a supervised parameter.
    pub fn parameter(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::Threshold => self.threshold,
            Parameter::RefractoryOffset => self.refractory_offset,
            Parameter::DecayFactor => self.decay_factor,
            Parameter::MembranePotential => self.potential,
        }
    }

    fn parameter_mut(&mut self, parameter: Parameter) -> &mut f64 {
        match parameter {
            Parameter::Threshold => &mut self.threshold,
            Parameter::RefractoryOffset => &mut self.refractory_offset,
            Parameter::DecayFactor => &mut self.decay_factor,
            Parameter::MembranePotential => &mut self.potential,
        }
    }

    /// Firing records within the recent window.
    pub fn recent_firings(&self) -> Vec<&FiringRecord> {
        self.history
            .recent(self.cfg.history_length)
            .iter()
            .filter(|r| r.fired)
            .collect()
    }

    // =========================================================================
    // INPUT CYCLE
    // =========================================================================

    /// Deliver one scalar input.
    ///
    /// Non-finite values are rejected before anything changes. While asleep
    /// the input is dropped and `Ok(None)` is returned.
    pub fn receive_input(&mut self, value: f64, source: Option<&str>) -> Result<Option<FireDecision>, CoreError> {
        if !value.is_finite() {
            return Err(CoreError::NonFiniteInput { value });
        }
        self.last_input_received = true;

        if self.asleep {
            debug!(event = "input_dropped", unit = %self.id, value, source, "asleep; input ignored");
            return Ok(None);
        }

        let before = self.potential;
        self.potential = integrate(self.potential, self.decay_factor, value, self.cfg.weights[0]);
        trace!(
            event = "integrate",
            unit = %self.id,
            value,
            source,
            before,
            after = self.potential,
            threshold = self.threshold,
            "input integrated"
        );

        let decision = self.decide_to_fire(value);
        Ok(Some(decision))
    }

    fn decide_to_fire(&mut self, value: f64) -> FireDecision {
        let decision = decide_fire(self.potential, self.threshold);
        match decision {
            FireDecision::Fire => {
                info!(
                    event = "fire",
                    unit = %self.id,
                    potential = self.potential,
                    threshold = self.threshold,
                    "unit fired"
                );
                self.history.push(value, true);
                self.enter_refractory();
                self.potential = self.cfg.baseline_potential;
                self.adapt(true);
                self.update_refractory();
            }
            FireDecision::Hold => {
                self.history.push(value, false);
                self.adapt(false);
                self.update_refractory();
            }
        }
        decision
    }

    fn adapt(&mut self, fired: bool) {
        if fired {
            return;
        }
        if !self.refractory.active && self.history.silent_for(self.cfg.history_length) {
            let old = self.threshold;
            self.threshold = lowered_threshold(self.threshold, self.baseline_threshold, self.cfg.silence_step);
            if self.threshold != old {
                debug!(
                    event = "silence_adapt",
                    unit = %self.id,
                    from = old,
                    to = self.threshold,
                    "lowering threshold after silent window"
                );
            }
        }
    }

    /// Enter the refractory window and raise the threshold.
    pub fn enter_refractory(&mut self) {
        self.refractory.enter();
        self.threshold = self.baseline_threshold + self.refractory_offset;
        debug!(event = "refractory_enter", unit = %self.id, threshold = self.threshold, "refractory entered");
    }

    /// Advance the refractory window by one cycle; restores the baseline
    /// threshold once `refractory_events` cycles have elapsed.
    pub fn update_refractory(&mut self) {
        if self.refractory.advance(self.cfg.refractory_events) {
            let old = self.threshold;
            self.threshold = self.baseline_threshold;
            debug!(
                event = "refractory_exit",
                unit = %self.id,
                from = old,
                to = self.threshold,
                "refractory ended"
            );
        }
    }

    /// Idle leakage for a cycle with no input.
    ///
    /// Decays only when the preceding cycle delivered no input, then clears
    /// the input latch. Does not advance the refractory window.
    pub fn passive_decay(&mut self) {
        if self.asleep {
            return;
        }
        if !self.last_input_received {
            let old = self.potential;
            self.potential *= self.decay_factor;
            if (self.potential - old).abs() > self.cfg.passive_decay_log_threshold {
                debug!(
                    event = "passive_decay",
                    unit = %self.id,
                    from = old,
                    to = self.potential,
                    "no input this cycle; potential decayed"
                );
            }
        }
        self.last_input_received = false;
    }

    /// A full no-input tick: passive decay, then one refractory step.
    pub fn idle_cycle(&mut self) {
        self.passive_decay();
        self.update_refractory();
    }

    pub fn sleep(&mut self) {
        self.asleep = true;
        info!(event = "sleep", unit = %self.id, "unit asleep; inputs will be ignored");
    }

    pub fn wake(&mut self) {
        self.asleep = false;
        info!(event = "wake", unit = %self.id, "unit awake");
    }

    // =========================================================================
    // SUPERVISOR CORRECTIONS
    // =========================================================================

    /// Hard-clamp `parameter` into `[safe_min, safe_max]`.
    ///
    /// `observed` is the value the supervisor saw; the clamp applies to the
    /// unit's current value. Returns the value after clamping.
    pub fn receive_boundary_notification(
        &mut self,
        parameter: Parameter,
        observed: f64,
        safe_min: f64,
        safe_max: f64,
    ) -> Result<f64, CoreError> {
        let bound = SafeBound::new(parameter, safe_min, safe_max)?;
        let id = self.id;
        let slot = self.parameter_mut(parameter);
        let old = *slot;
        *slot = bound.clamp(old);
        let new = *slot;
        info!(
            event = "boundary_clamp",
            unit = %id,
            parameter = %parameter,
            observed,
            from = old,
            to = new,
            safe_min,
            safe_max,
            "parameter clamped to safe bounds"
        );
        Ok(new)
    }

    /// Apply supervisor-directed group corrections.
    ///
    /// Each step only moves its parameter in the requested direction; a value
    /// already past its cap or floor is left where it is.
    pub fn adapt_parameters(&mut self, correction: Correction) {
        let c = &self.correction_cfg;
        if correction.increase_refractory_offset && self.refractory_offset < c.refractory_offset_cap {
            self.refractory_offset = (self.refractory_offset + c.refractory_offset_step).min(c.refractory_offset_cap);
        }
        if correction.decrease_decay_factor && self.decay_factor > c.decay_factor_floor {
            self.decay_factor = (self.decay_factor - c.decay_factor_step).max(c.decay_factor_floor);
        }
        if correction.network_dampening && self.threshold < c.dampening_cap {
            self.threshold = (self.threshold + c.dampening_step).min(c.dampening_cap);
        }
        info!(
            event = "adapt_parameters",
            unit = %self.id,
            refractory_offset = self.refractory_offset,
            decay_factor = self.decay_factor,
            threshold = self.threshold,
            network_dampening = correction.network_dampening,
            "applied supervisor correction"
        );
    }

    /// External feedback on firing accuracy.
    pub fn receive_feedback(&mut self, feedback: Feedback, source: &str) {
        let c = &self.correction_cfg;
        let old = self.threshold;
        match feedback {
            Feedback::Positive => self.threshold = c.feedback_floor.max(self.threshold - c.feedback_step),
            Feedback::Negative => self.threshold += c.feedback_step,
            Feedback::Neutral => {}
        }
        debug!(
            event = "feedback",
            unit = %self.id,
            ?feedback,
            source,
            from = old,
            to = self.threshold,
            "feedback received"
        );
    }

    // =========================================================================
    // PATTERNS
    // =========================================================================

    fn shift_trust(&mut self, delta: f64) {
        self.trust_score = (self.trust_score + delta).clamp(0.0, 1.0);
    }

    /// Start monitoring `pattern`. Idempotent.
    pub fn receive_pattern_notification(&mut self, pattern: &str) -> AdoptionStatus {
        if self.patterns_monitored.insert(pattern.to_string()) {
            info!(event = "pattern_notified", unit = %self.id, pattern, "monitoring pattern");
        }
        AdoptionStatus::Monitoring
    }

    /// Trust-gated response to a recommendation.
    ///
    /// Returns `None` when the pattern is already adopted (no trust change).
    pub fn receive_pattern_recommendation(&mut self, pattern: &str, supervisor: SupervisorId) -> Option<AdoptionStatus> {
        if self.patterns_adopted.contains(pattern) {
            return None;
        }
        let t = self.trust_cfg.clone();
        let status = if self.trust_score > t.adopt_threshold {
            self.patterns_adopted.insert(pattern.to_string());
            self.shift_trust(t.increment);
            AdoptionStatus::Adopted
        } else if self.trust_score < t.challenge_threshold {
            self.shift_trust(-t.decrement);
            AdoptionStatus::Challenging
        } else {
            self.shift_trust(-t.debate_decrement);
            AdoptionStatus::Debating
        };
        info!(
            event = "pattern_recommendation",
            unit = %self.id,
            %supervisor,
            pattern,
            status = %status,
            trust = self.trust_score,
            "responded to recommendation"
        );
        Some(status)
    }

    /// Meet `pattern` in the input stream. Only monitored patterns count.
    pub fn encounter_pattern(&mut self, pattern: &str, negative: bool) -> Option<AdoptionStatus> {
        if !self.patterns_monitored.contains(pattern) {
            return None;
        }
        let status = if negative {
            self.shift_trust(-self.trust_cfg.decrement);
            AdoptionStatus::Revised
        } else {
            self.patterns_adopted.insert(pattern.to_string());
            self.shift_trust(self.trust_cfg.increment);
            AdoptionStatus::Independent
        };
        info!(
            event = "pattern_encounter",
            unit = %self.id,
            pattern,
            negative,
            status = %status,
            trust = self.trust_score,
            "encountered pattern"
        );
        Some(status)
    }

    /// Pass an adopted pattern on to `other` as a notification.
    pub fn share_pattern(&self, other: &mut Unit, pattern: &str) -> Option<AdoptionStatus> {
        if !self.patterns_adopted.contains(pattern) {
            return None;
        }
        debug!(event = "pattern_shared", unit = %self.id, peer = %other.id, pattern, "sharing pattern");
        Some(other.receive_pattern_notification(pattern))
    }
}
