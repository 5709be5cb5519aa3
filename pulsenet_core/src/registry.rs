//! Pattern registry: who subscribes to which pattern, and where each unit
//! stands on it.
//!
//! Units are keyed by id, supervisors by id. The registry never holds a live
//! reference to either.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::CoreError;
use crate::ids::{SupervisorId, UnitId};
use crate::pattern::AdoptionStatus;
use crate::unit::Unit;

/// Raised when enough distinct units have revised the same pattern.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionAlert {
    pub pattern: String,
    pub revised_units: usize,
    /// Supervisors subscribed to the pattern at the time of the alert.
    pub subscribers: Vec<SupervisorId>,
}

#[derive(Clone, Debug)]
pub struct PatternRegistry {
    patterns: HashMap<String, Vec<SupervisorId>>,
    adoption: HashMap<UnitId, HashMap<String, AdoptionStatus>>,
    adoption_threshold: usize,
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self {
            patterns: HashMap::new(),
            adoption: HashMap::new(),
            adoption_threshold: 3,
        }
    }
}

impl PatternRegistry {
    /// `adoption_threshold` is the number of revising units that raises an
    /// alert; it must be at least 1.
    pub fn new(adoption_threshold: usize) -> Result<Self, CoreError> {
        if adoption_threshold == 0 {
            return Err(CoreError::InvalidConfig("adoption_threshold must be >= 1".into()));
        }
        Ok(Self {
            adoption_threshold,
            ..Self::default()
        })
    }

    pub fn adoption_threshold(&self) -> usize {
        self.adoption_threshold
    }

    /// Subscribe `supervisor` to `pattern`. Duplicates are kept.
    pub fn register_pattern(&mut self, pattern: &str, supervisor: SupervisorId) {
        self.patterns.entry(pattern.to_string()).or_default().push(supervisor);
        info!(event = "pattern_registered", pattern, %supervisor, "pattern registered");
    }

    pub fn subscribers(&self, pattern: &str) -> &[SupervisorId] {
        self.patterns.get(pattern).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_registered(&self, pattern: &str) -> bool {
        self.patterns.contains_key(pattern)
    }

    /// Deliver a pattern notification to `unit`.
    pub fn notify_unit(&self, unit: &mut Unit, pattern: &str) -> AdoptionStatus {
        info!(event = "notify_unit", unit = %unit.id(), pattern, "notifying unit");
        unit.receive_pattern_notification(pattern)
    }

    /// Notify and record the resulting `monitoring` status.
    pub fn notify_and_record(&mut self, unit: &mut Unit, pattern: &str) -> Option<RevisionAlert> {
        let status = self.notify_unit(unit, pattern);
        self.update_adoption(unit.id(), pattern, status)
    }

    /// Overwrite the status for `(unit, pattern)`.
    ///
    /// Returns an alert when the count of distinct units at `revised` for this
    /// pattern reaches the adoption threshold.
    #[must_use]
    pub fn update_adoption(&mut self, unit: UnitId, pattern: &str, status: AdoptionStatus) -> Option<RevisionAlert> {
        self.adoption.entry(unit).or_default().insert(pattern.to_string(), status);
        info!(event = "adoption_update", %unit, pattern, status = %status, "adoption status recorded");

        if status != AdoptionStatus::Revised {
            return None;
        }
        let revised = self.revised_count(pattern);
        if revised < self.adoption_threshold {
            return None;
        }
        warn!(
            event = "revision_threshold",
            pattern,
            revised,
            threshold = self.adoption_threshold,
            "multiple units revised pattern"
        );
        Some(RevisionAlert {
            pattern: pattern.to_string(),
            revised_units: revised,
            subscribers: self.subscribers(pattern).to_vec(),
        })
    }

    pub fn status(&self, unit: UnitId, pattern: &str) -> Option<AdoptionStatus> {
        self.adoption.get(&unit).and_then(|m| m.get(pattern)).copied()
    }

    /// Distinct units currently at `revised` for `pattern`.
    pub fn revised_count(&self, pattern: &str) -> usize {
        self.adoption
            .values()
            .filter(|m| m.get(pattern) == Some(&AdoptionStatus::Revised))
            .count()
    }

    /// Unit-to-unit sharing, recorded as if the registry had notified `other`.
    pub fn share_pattern(&mut self, sharer: &Unit, other: &mut Unit, pattern: &str) -> Option<AdoptionStatus> {
        let status = sharer.share_pattern(other, pattern)?;
        // Sharing only ever yields `monitoring`, which never raises an alert.
        let _ = self.update_adoption(other.id(), pattern, status);
        Some(status)
    }

    /// Encounter `pattern` on `unit` and record any resulting status.
    pub fn encounter(&mut self, unit: &mut Unit, pattern: &str, negative: bool) -> (Option<AdoptionStatus>, Option<RevisionAlert>) {
        match unit.encounter_pattern(pattern, negative) {
            Some(status) => (Some(status), self.update_adoption(unit.id(), pattern, status)),
            None => (None, None),
        }
    }
}
