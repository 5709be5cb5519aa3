use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------
// Supervised parameters & safe bounds
// ---------------------------------------------------------------------

/// Unit parameters a supervisor may observe and clamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Parameter {
    Threshold,
    RefractoryOffset,
    DecayFactor,
    /// Maps onto the unit's `potential`.
    MembranePotential,
}

impl Parameter {
    pub const ALL: [Parameter; 4] = [
        Parameter::Threshold,
        Parameter::RefractoryOffset,
        Parameter::DecayFactor,
        Parameter::MembranePotential,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::Threshold => "threshold",
            Parameter::RefractoryOffset => "refractoryOffset",
            Parameter::DecayFactor => "decayFactor",
            Parameter::MembranePotential => "membranePotential",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Parameter {
    type Err = CoreError;

    /// Accepts both camelCase and snake_case names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "threshold" => Ok(Parameter::Threshold),
            "refractoryOffset" | "refractory_offset" => Ok(Parameter::RefractoryOffset),
            "decayFactor" | "decay_factor" => Ok(Parameter::DecayFactor),
            "membranePotential" | "membrane_potential" => Ok(Parameter::MembranePotential),
            other => Err(CoreError::UnknownParameter(other.to_string())),
        }
    }
}

/// Inclusive `[min, max]` band for one parameter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SafeBound {
    pub min: f64,
    pub max: f64,
}

impl SafeBound {
    /// Build a band, rejecting `min >= max` and non-finite edges.
    pub fn new(parameter: Parameter, min: f64, max: f64) -> Result<Self, CoreError> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(CoreError::InvertedBound {
                parameter: parameter.to_string(),
                min,
                max,
            });
        }
        Ok(Self { min, max })
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Hard clamp to the nearest edge.
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

pub type SafeBounds = BTreeMap<Parameter, SafeBound>;

/// Default safe bounds for every supervised parameter.
pub fn default_safe_bounds() -> SafeBounds {
    let mut m = SafeBounds::new();
    m.insert(Parameter::Threshold, SafeBound { min: 0.5, max: 2.0 });
    m.insert(Parameter::RefractoryOffset, SafeBound { min: 0.0, max: 1.0 });
    m.insert(Parameter::DecayFactor, SafeBound { min: 0.5, max: 1.0 });
    m.insert(Parameter::MembranePotential, SafeBound { min: -1.0, max: 3.0 });
    m
}

/// Reject any band with `min >= max`.
pub fn validate_safe_bounds(bounds: &SafeBounds) -> Result<(), CoreError> {
    for (p, b) in bounds {
        SafeBound::new(*p, b.min, b.max)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------
// Unsafe-fraction scoring
// ---------------------------------------------------------------------

/// Parameters for turning a value's position in its band into a score in [0,1].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnsafeParams {
    /// Soft margin as a fraction of the band width.
    pub soft_margin: f64,
    /// Multiplier on the raw fraction before clamping.
    pub sensitivity: f64,
}

impl Default for UnsafeParams {
    fn default() -> Self {
        Self {
            soft_margin: 0.1,
            sensitivity: 1.0,
        }
    }
}

/// How unsafe `value` is relative to `bound`.
///
/// Strictly inside the soft margin the score is 0. Inside the margin it grows
/// with proximity to the nearer edge; outside the band it keeps growing with
/// the overshoot. Distances are measured from the margin line and expressed
/// relative to the band width, then scaled by `sensitivity` and clamped.
pub fn unsafe_fraction(value: f64, bound: &SafeBound, params: &UnsafeParams) -> f64 {
    if !value.is_finite() {
        return 1.0;
    }
    let width = bound.width();
    let margin = width * params.soft_margin.clamp(0.0, 0.5);
    let lo = bound.min + margin;
    let hi = bound.max - margin;

    let raw = if value > lo && value < hi {
        0.0
    } else if value <= lo {
        (lo - value) / width
    } else {
        (value - hi) / width
    };

    (raw * params.sensitivity.max(0.0)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_names_round_trip() {
        for p in Parameter::ALL {
            assert_eq!(p.as_str().parse::<Parameter>().unwrap(), p);
        }
        assert_eq!("decay_factor".parse::<Parameter>().unwrap(), Parameter::DecayFactor);
        assert!("gain".parse::<Parameter>().is_err());
    }

    #[test]
    fn inverted_bound_rejected() {
        assert!(SafeBound::new(Parameter::Threshold, 2.0, 0.5).is_err());
        assert!(SafeBound::new(Parameter::Threshold, 1.0, 1.0).is_err());
    }

    #[test]
    fn fraction_zero_inside_margin() {
        let b = SafeBound { min: 0.0, max: 1.0 };
        let p = UnsafeParams::default();
        assert_eq!(unsafe_fraction(0.5, &b, &p), 0.0);
        assert!((unsafe_fraction(0.0, &b, &p) - 0.1).abs() < 1e-9);
        assert!((unsafe_fraction(1.5, &b, &p) - 0.6).abs() < 1e-9);
        assert_eq!(unsafe_fraction(50.0, &b, &p), 1.0);
    }
}
