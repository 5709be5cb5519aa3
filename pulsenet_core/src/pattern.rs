use std::fmt;

use serde::{Deserialize, Serialize};

/// Adoption status of one pattern for one unit.
///
/// Transitions are not enforced: any status may follow any other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdoptionStatus {
    Monitoring,
    Debating,
    Challenging,
    Adopted,
    Independent,
    Revised,
}

impl AdoptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdoptionStatus::Monitoring => "monitoring",
            AdoptionStatus::Debating => "debating",
            AdoptionStatus::Challenging => "challenging",
            AdoptionStatus::Adopted => "adopted",
            AdoptionStatus::Independent => "independent",
            AdoptionStatus::Revised => "revised",
        }
    }
}

impl fmt::Display for AdoptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
