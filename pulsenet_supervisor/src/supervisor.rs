//! Reputation and safety supervisor.
//!
//! Holds only derived state keyed by unit id and pattern name:
//! - trust per unit, confidence per pattern
//! - safe bounds and the unsafe-fraction gate
//! - an append-only learning journal
//!
//! Units are borrowed per call through [`SupervisedUnit`]. All mutation goes
//! through `&mut self`, so the shared maps have a single writer.

use std::collections::{BTreeMap, HashMap};

use pulsenet_core::{
    default_safe_bounds, unsafe_fraction, validate_safe_bounds, AdoptionStatus, Correction, Parameter,
    PatternRegistry, RevisionAlert, SafeBound, SafeBounds, SupervisorId, UnitId, UnsafeParams,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::adapter::SupervisedUnit;
use crate::error::SupervisorError;
use crate::journal::{LearningEvent, LearningKind};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SupervisorCfg {
    /// Multiplier on the unsafe fraction.
    pub sensitivity: f64,
    pub learning_rate: f64,
    /// Added to `learning_rate` on each missed drift.
    pub learning_rate_step: f64,
    pub learning_rate_cap: f64,
    /// Size of the recent learning-history view.
    pub memory_window: usize,
    /// Unsafe fraction at or above which a boundary notification is issued.
    pub notification_threshold: f64,
    /// Soft margin as a fraction of each bound's width.
    pub soft_margin: f64,
    pub confidence_step: f64,
    pub initial_confidence: f64,
    /// Trust assumed for units never seen before.
    pub default_trust: f64,
    /// Trust above which confidence rises.
    pub trust_high: f64,
    /// Trust below which a recommendation lowers confidence.
    pub trust_low: f64,
    pub safe_bounds: SafeBounds,
}

impl Default for SupervisorCfg {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            learning_rate: 0.1,
            learning_rate_step: 0.05,
            learning_rate_cap: 1.0,
            memory_window: 20,
            notification_threshold: 0.3,
            soft_margin: 0.1,
            confidence_step: 0.2,
            initial_confidence: 0.5,
            default_trust: 0.5,
            trust_high: 0.8,
            trust_low: 0.3,
            safe_bounds: default_safe_bounds(),
        }
    }
}

impl SupervisorCfg {
    pub fn validate(&self) -> Result<(), SupervisorError> {
        if !(self.notification_threshold > 0.0 && self.notification_threshold <= 1.0) {
            return Err(SupervisorError::InvalidConfig(format!(
                "notification_threshold must be in (0, 1], got {}",
                self.notification_threshold
            )));
        }
        for (name, v) in [
            ("initial_confidence", self.initial_confidence),
            ("default_trust", self.default_trust),
            ("trust_high", self.trust_high),
            ("trust_low", self.trust_low),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(SupervisorError::InvalidConfig(format!("{name} must be in [0, 1], got {v}")));
            }
        }
        if self.memory_window == 0 {
            return Err(SupervisorError::InvalidConfig("memory_window must be >= 1".into()));
        }
        if !(0.0..0.5).contains(&self.soft_margin) {
            return Err(SupervisorError::InvalidConfig("soft_margin must be in [0, 0.5)".into()));
        }
        validate_safe_bounds(&self.safe_bounds)?;
        Ok(())
    }

    fn unsafe_params(&self) -> UnsafeParams {
        UnsafeParams {
            soft_margin: self.soft_margin,
            sensitivity: self.sensitivity,
        }
    }
}

/// One boundary notification issued by [`Supervisor::monitor_bounds`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundaryNotice {
    pub unit: UnitId,
    pub parameter: Parameter,
    pub observed: f64,
    pub unsafe_fraction: f64,
    pub clamped_to: f64,
}

/// Result of a rapid-firing sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RapidFiringReport {
    pub pattern: String,
    pub flagged: Vec<UnitId>,
    pub network_dampening: bool,
}

/// Pure-data export of supervisor-derived state.
///
/// Deterministic ordering: entries are sorted by key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SupervisorSnapshot {
    pub trust_scores: Vec<(UnitId, f64)>,
    pub pattern_confidence: Vec<(String, f64)>,
    pub learning_rate: f64,
}

/// Counters returned by restore operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreStats {
    /// Entries applied from the snapshot.
    pub applied: usize,
    /// Existing entries that were overwritten.
    pub overwritten: usize,
    /// Non-finite entries that were dropped.
    pub skipped: usize,
}

#[derive(Debug)]
pub struct Supervisor {
    id: SupervisorId,
    cfg: SupervisorCfg,
    learning_rate: f64,
    trust_scores: HashMap<UnitId, f64>,
    pattern_confidence: BTreeMap<String, f64>,
    learning_history: Vec<LearningEvent>,
}

impl Supervisor {
    pub fn new(cfg: SupervisorCfg) -> Result<Self, SupervisorError> {
        cfg.validate()?;
        Ok(Self {
            id: SupervisorId::new(),
            learning_rate: cfg.learning_rate,
            cfg,
            trust_scores: HashMap::new(),
            pattern_confidence: BTreeMap::new(),
            learning_history: Vec::new(),
        })
    }

    pub fn id(&self) -> SupervisorId {
        self.id
    }

    pub fn cfg(&self) -> &SupervisorCfg {
        &self.cfg
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Trust held for `unit`, or the default when never updated.
    pub fn trust_score(&self, unit: UnitId) -> f64 {
        self.trust_scores.get(&unit).copied().unwrap_or(self.cfg.default_trust)
    }

    pub fn pattern_confidence(&self, pattern: &str) -> Option<f64> {
        self.pattern_confidence.get(pattern).copied()
    }

    pub fn learning_history(&self) -> &[LearningEvent] {
        &self.learning_history
    }

    /// The last `memory_window` journal records, oldest first.
    pub fn recent_learning(&self) -> &[LearningEvent] {
        let start = self.learning_history.len().saturating_sub(self.cfg.memory_window);
        &self.learning_history[start..]
    }

    fn journal(&mut self, event: LearningEvent) {
        self.learning_history.push(event);
    }

    fn shift_confidence(&mut self, pattern: &str, delta: f64) {
        let initial = self.cfg.initial_confidence;
        let c = self.pattern_confidence.entry(pattern.to_string()).or_insert(initial);
        *c = (*c + delta).clamp(0.0, 1.0);
    }

    fn shift_all_confidence(&mut self, delta: f64) {
        for c in self.pattern_confidence.values_mut() {
            *c = (*c + delta).clamp(0.0, 1.0);
        }
    }

    // =========================================================================
    // PATTERNS
    // =========================================================================

    /// Register `pattern` with the registry and seed its confidence.
    pub fn discover_pattern(&mut self, registry: &mut PatternRegistry, pattern: &str) {
        registry.register_pattern(pattern, self.id);
        let initial = self.cfg.initial_confidence;
        self.pattern_confidence.entry(pattern.to_string()).or_insert(initial);
        info!(event = "pattern_discovered", supervisor = %self.id, pattern, "pattern discovered");
        self.journal(LearningEvent::new(LearningKind::PatternDiscovered).with_pattern(pattern));
    }

    /// Recommend `pattern` to `unit`, record the outcome, and move confidence
    /// in the direction of the unit's post-recommendation trust.
    pub fn recommend_pattern<U: SupervisedUnit + ?Sized>(
        &mut self,
        registry: &mut PatternRegistry,
        unit: &mut U,
        pattern: &str,
    ) -> Option<AdoptionStatus> {
        let status = unit.receive_pattern_recommendation(pattern, self.id);
        if let Some(status) = status {
            if let Some(alert) = registry.update_adoption(unit.unit_id(), pattern, status) {
                self.escalate(&alert);
            }
        }

        let trust = unit.trust_score();
        let step = self.cfg.confidence_step;
        if trust > self.cfg.trust_high {
            self.shift_confidence(pattern, step);
        } else if trust < self.cfg.trust_low {
            self.shift_confidence(pattern, -step);
        }

        debug!(
            event = "recommend",
            supervisor = %self.id,
            unit = %unit.unit_id(),
            pattern,
            trust,
            confidence = self.pattern_confidence(pattern),
            "recommendation delivered"
        );
        let mut ev = LearningEvent::new(LearningKind::Recommendation)
            .with_unit(unit.unit_id())
            .with_pattern(pattern)
            .with_field("unit_trust", trust);
        if let Some(s) = status {
            ev = ev.with_field("status", s.as_str());
        }
        self.journal(ev);
        status
    }

    /// Route a registry revision alert to this supervisor's review hook.
    ///
    /// Returns `false` when this supervisor is not subscribed to the pattern.
    pub fn escalate(&self, alert: &RevisionAlert) -> bool {
        if !alert.subscribers.contains(&self.id) {
            return false;
        }
        self.reflect_on_revision(&alert.pattern);
        true
    }

    /// Observability hook for patterns that many units have revised.
    pub fn reflect_on_revision(&self, pattern: &str) {
        warn!(
            event = "global_review",
            supervisor = %self.id,
            pattern,
            "multiple units revised pattern; global review triggered"
        );
    }

    // =========================================================================
    // TRUST
    // =========================================================================

    /// Apply `delta` to the trust held for `unit`, clamped to [0, 1].
    ///
    /// Negative deltas lower every tracked pattern's confidence; positive
    /// deltas that end above `trust_high` raise every pattern's confidence.
    /// A non-finite delta is rejected and changes nothing.
    pub fn update_trust(&mut self, unit: UnitId, delta: f64, context: Option<&str>) -> Result<f64, SupervisorError> {
        if !delta.is_finite() {
            return Err(SupervisorError::NonFiniteDelta { delta });
        }
        let old = self.trust_score(unit);
        let new = (old + delta).clamp(0.0, 1.0);
        self.trust_scores.insert(unit, new);

        let step = self.cfg.confidence_step;
        if delta < 0.0 {
            self.shift_all_confidence(-step);
            debug!(event = "skepticism", supervisor = %self.id, %unit, "unit skeptical; reviewing pattern classifications");
        } else if delta > 0.0 && new > self.cfg.trust_high {
            self.shift_all_confidence(step);
            debug!(event = "independent_adaptation", supervisor = %self.id, %unit, "unit adapted; reinforcing pattern criteria");
        }

        info!(event = "trust_update", supervisor = %self.id, %unit, from = old, to = new, context, "trust updated");
        let mut ev = LearningEvent::new(LearningKind::TrustUpdate)
            .with_unit(unit)
            .with_field("from", old)
            .with_field("to", new)
            .with_field("delta", delta);
        if let Some(ctx) = context {
            ev = ev.with_field("context", ctx);
        }
        self.journal(ev);
        Ok(new)
    }

    /// Raise the learning rate after drift that monitoring failed to catch.
    pub fn note_missed_drift(&mut self, unit: UnitId) -> f64 {
        let old = self.learning_rate;
        self.learning_rate = (self.learning_rate + self.cfg.learning_rate_step).min(self.cfg.learning_rate_cap);
        info!(event = "missed_drift", supervisor = %self.id, %unit, from = old, to = self.learning_rate, "learning rate raised");
        self.journal(
            LearningEvent::new(LearningKind::MissedDrift)
                .with_unit(unit)
                .with_field("learning_rate", self.learning_rate),
        );
        self.learning_rate
    }

    // =========================================================================
    // SAFETY BOUNDS
    // =========================================================================

    /// Issue a boundary notification for one parameter regardless of score.
    ///
    /// Fails when the parameter has no configured safe bound.
    pub fn notify_boundary<U: SupervisedUnit + ?Sized>(
        &mut self,
        unit: &mut U,
        parameter: Parameter,
    ) -> Result<BoundaryNotice, SupervisorError> {
        let bound = *self
            .cfg
            .safe_bounds
            .get(&parameter)
            .ok_or(SupervisorError::MissingBound(parameter))?;
        let observed = unit.parameter(parameter);
        let fraction = unsafe_fraction(observed, &bound, &self.cfg.unsafe_params());
        self.issue_notice(unit, parameter, observed, fraction, bound.min, bound.max)
    }

    fn issue_notice<U: SupervisedUnit + ?Sized>(
        &mut self,
        unit: &mut U,
        parameter: Parameter,
        observed: f64,
        fraction: f64,
        min: f64,
        max: f64,
    ) -> Result<BoundaryNotice, SupervisorError> {
        let clamped_to = unit.receive_boundary_notification(parameter, observed, min, max)?;
        let id = unit.unit_id();
        warn!(
            event = "boundary_notification",
            supervisor = %self.id,
            unit = %id,
            parameter = %parameter,
            observed,
            unsafe_fraction = fraction,
            clamped_to,
            "parameter outside safe bounds"
        );
        self.journal(
            LearningEvent::new(LearningKind::BoundaryNotification)
                .with_unit(id)
                .with_field("parameter", parameter.as_str())
                .with_field("observed", observed)
                .with_field("unsafe_fraction", fraction)
                .with_field("safe_min", min)
                .with_field("safe_max", max)
                .with_field("clamped_to", clamped_to),
        );
        Ok(BoundaryNotice {
            unit: id,
            parameter,
            observed,
            unsafe_fraction: fraction,
            clamped_to,
        })
    }

    /// Score every bounded parameter of `unit` and clamp those whose unsafe
    /// fraction reaches `notification_threshold`.
    pub fn monitor_bounds<U: SupervisedUnit + ?Sized>(
        &mut self,
        unit: &mut U,
    ) -> Result<Vec<BoundaryNotice>, SupervisorError> {
        let params = self.cfg.unsafe_params();
        let bounds: Vec<(Parameter, f64, f64)> = self
            .cfg
            .safe_bounds
            .iter()
            .map(|(p, b)| (*p, b.min, b.max))
            .collect();

        let mut out = Vec::new();
        for (parameter, min, max) in bounds {
            let observed = unit.parameter(parameter);
            let bound = SafeBound { min, max };
            let fraction = unsafe_fraction(observed, &bound, &params);
            if fraction >= self.cfg.notification_threshold {
                out.push(self.issue_notice(unit, parameter, observed, fraction, min, max)?);
            }
        }
        Ok(out)
    }

    // =========================================================================
    // RAPID FIRING
    // =========================================================================

    /// Flag units with at least `rapid_firing_threshold` firings and correct
    /// them; when more than one is flagged, dampen every flagged unit too.
    pub fn monitor_neurons<'a, U, I>(
        &mut self,
        units: I,
        pattern: &str,
        rapid_firing_threshold: usize,
    ) -> RapidFiringReport
    where
        U: SupervisedUnit + ?Sized + 'a,
        I: IntoIterator<Item = &'a mut U>,
    {
        let mut flagged: Vec<&'a mut U> = units
            .into_iter()
            .filter(|u| u.firing_count() >= rapid_firing_threshold)
            .collect();

        let dampen = flagged.len() > 1;
        for unit in flagged.iter_mut() {
            unit.adapt_parameters(Correction::RAPID_FIRING);
            let id = unit.unit_id();
            self.journal(
                LearningEvent::new(LearningKind::RapidFiring)
                    .with_unit(id)
                    .with_pattern(pattern)
                    .with_field("firings", unit.firing_count()),
            );
            if dampen {
                unit.adapt_parameters(Correction::NETWORK_DAMPENING);
                self.journal(
                    LearningEvent::new(LearningKind::NetworkDampening)
                        .with_unit(id)
                        .with_pattern(pattern),
                );
            }
        }

        let report = RapidFiringReport {
            pattern: pattern.to_string(),
            flagged: flagged.iter().map(|u| u.unit_id()).collect(),
            network_dampening: dampen,
        };
        if !report.flagged.is_empty() {
            warn!(
                event = "rapid_firing",
                supervisor = %self.id,
                pattern,
                flagged = report.flagged.len(),
                network_dampening = dampen,
                "rapid firing detected"
            );
        }
        report
    }

    // =========================================================================
    // SNAPSHOT
    // =========================================================================

    /// Export trust, confidence, and learning rate as plain data.
    ///
    /// No IO: callers decide how/where to store it.
    pub fn snapshot(&self) -> SupervisorSnapshot {
        let mut trust_scores: Vec<(UnitId, f64)> = self.trust_scores.iter().map(|(k, v)| (*k, *v)).collect();
        trust_scores.sort_by(|a, b| a.0.cmp(&b.0));
        SupervisorSnapshot {
            trust_scores,
            pattern_confidence: self.pattern_confidence.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            learning_rate: self.learning_rate,
        }
    }

    /// Replace derived state with a snapshot. Values are clamped to [0, 1].
    pub fn restore(&mut self, snap: SupervisorSnapshot) -> RestoreStats {
        self.trust_scores.clear();
        self.pattern_confidence.clear();
        self.restore_merge(snap)
    }

    /// Merge a snapshot into current state; snapshot entries win on conflict.
    /// Non-finite values are skipped.
    pub fn restore_merge(&mut self, snap: SupervisorSnapshot) -> RestoreStats {
        let mut stats = RestoreStats::default();
        for (unit, score) in snap.trust_scores {
            if !score.is_finite() {
                debug!(event = "restore_skip", supervisor = %self.id, %unit, score, "non-finite trust dropped");
                stats.skipped += 1;
                continue;
            }
            if self.trust_scores.insert(unit, score.clamp(0.0, 1.0)).is_some() {
                stats.overwritten += 1;
            }
            stats.applied += 1;
        }
        for (pattern, conf) in snap.pattern_confidence {
            if !conf.is_finite() {
                debug!(event = "restore_skip", supervisor = %self.id, pattern = %pattern, conf, "non-finite confidence dropped");
                stats.skipped += 1;
                continue;
            }
            if self.pattern_confidence.insert(pattern, conf.clamp(0.0, 1.0)).is_some() {
                stats.overwritten += 1;
            }
            stats.applied += 1;
        }
        if snap.learning_rate.is_finite() {
            self.learning_rate = snap.learning_rate.clamp(0.0, self.cfg.learning_rate_cap);
        }
        stats
    }
}
