//! pulsenet_core
//!
//! Threshold-triggered units and the pattern registry they share.
//!
//! - `Unit`: leaky integrate, fire, refractory window, silence adaptation
//! - `PatternRegistry`: pattern subscriptions and per-unit adoption status
//! - safe-bound profiles and unsafe-fraction scoring used by supervisors
//!
//! No IO. No async. Logging goes through `tracing`; the caller picks the sink.

pub mod bounds;
pub mod cfg;
pub mod decide;
pub mod error;
pub mod history;
pub mod ids;
pub mod pattern;
pub mod registry;
pub mod state;
pub mod unit;

pub use bounds::{
    default_safe_bounds, unsafe_fraction, validate_safe_bounds, Parameter, SafeBound, SafeBounds, UnsafeParams,
};
pub use cfg::{CorrectionCfg, TrustCfg, UnitCfg};
pub use decide::{decide_fire, Feedback, FireDecision};
pub use error::CoreError;
pub use history::{FiringHistory, FiringRecord};
pub use ids::{SupervisorId, UnitId};
pub use pattern::AdoptionStatus;
pub use registry::{PatternRegistry, RevisionAlert};
pub use state::RefractoryState;
pub use unit::{Correction, Unit};
