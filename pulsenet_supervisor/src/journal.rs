//! Structured learning history kept by the supervisor.

use chrono::{DateTime, Utc};
use pulsenet_core::UnitId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event-type tag for a journal record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningKind {
    PatternDiscovered,
    Recommendation,
    TrustUpdate,
    BoundaryNotification,
    RapidFiring,
    NetworkDampening,
    MissedDrift,
}

/// One append-only learning record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LearningEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: LearningKind,
    pub unit: Option<UnitId>,
    pub pattern: Option<String>,
    pub payload: Map<String, Value>,
}

impl LearningEvent {
    pub fn new(kind: LearningKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            unit: None,
            pattern: None,
            payload: Map::new(),
        }
    }

    pub fn with_unit(mut self, unit: UnitId) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Attach a payload field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}
