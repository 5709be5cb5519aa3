//! Capability interface between the supervisor and the units it watches.
//!
//! The supervisor never stores a unit. It borrows one for the duration of a
//! call through `SupervisedUnit`, which exposes only what supervision needs:
//! - read: id, trust, supervised parameters, firing count
//! - write: boundary clamps, group corrections, recommendations
//!
//! `Unit` implements it directly; tests and embedders may supply their own.

use pulsenet_core::{AdoptionStatus, CoreError, Correction, Parameter, SupervisorId, Unit, UnitId};

/// The narrow surface a supervisor is allowed to touch.
pub trait SupervisedUnit {
    fn unit_id(&self) -> UnitId;

    fn trust_score(&self) -> f64;

    fn parameter(&self, parameter: Parameter) -> f64;

    /// Firing events over the unit's full history.
    fn firing_count(&self) -> usize;

    fn receive_boundary_notification(
        &mut self,
        parameter: Parameter,
        observed: f64,
        safe_min: f64,
        safe_max: f64,
    ) -> Result<f64, CoreError>;

    fn adapt_parameters(&mut self, correction: Correction);

    fn receive_pattern_recommendation(&mut self, pattern: &str, supervisor: SupervisorId) -> Option<AdoptionStatus>;
}

impl SupervisedUnit for Unit {
    fn unit_id(&self) -> UnitId {
        self.id()
    }

    fn trust_score(&self) -> f64 {
        Unit::trust_score(self)
    }

    fn parameter(&self, parameter: Parameter) -> f64 {
        Unit::parameter(self, parameter)
    }

    fn firing_count(&self) -> usize {
        self.history().firing_count()
    }

    fn receive_boundary_notification(
        &mut self,
        parameter: Parameter,
        observed: f64,
        safe_min: f64,
        safe_max: f64,
    ) -> Result<f64, CoreError> {
        Unit::receive_boundary_notification(self, parameter, observed, safe_min, safe_max)
    }

    fn adapt_parameters(&mut self, correction: Correction) {
        Unit::adapt_parameters(self, correction)
    }

    fn receive_pattern_recommendation(&mut self, pattern: &str, supervisor: SupervisorId) -> Option<AdoptionStatus> {
        Unit::receive_pattern_recommendation(self, pattern, supervisor)
    }
}
