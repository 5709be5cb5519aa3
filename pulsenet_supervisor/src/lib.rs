//! pulsenet_supervisor
//!
//! Supervision layer over `pulsenet_core` units.
//!
//! Responsibilities:
//! - keep per-unit trust and per-pattern confidence, clamped to [0, 1]
//! - score supervised parameters against safe bounds and clamp unsafe ones
//! - detect rapid firing and scale corrections with the breadth of the anomaly
//! - journal every intervention as a structured learning record
//!
//! Non-goals:
//! - no IO
//! - no async
//! - no ownership of units (they are borrowed per call)

pub mod adapter;
pub mod error;
pub mod journal;
pub mod supervisor;

pub use adapter::SupervisedUnit;
pub use error::SupervisorError;
pub use journal::{LearningEvent, LearningKind};
pub use supervisor::{
    BoundaryNotice,
    RapidFiringReport,
    RestoreStats,
    Supervisor,
    SupervisorCfg,
    SupervisorSnapshot,
};
