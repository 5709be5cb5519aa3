use thiserror::Error;

/// Errors raised by the unit core.
///
/// Clamping trust or parameters is normal operation and never surfaces here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("non-finite input value {value} rejected before integration")]
    NonFiniteInput { value: f64 },

    #[error("unknown parameter name: {0}")]
    UnknownParameter(String),

    #[error("inverted safe bound for {parameter}: min {min} >= max {max}")]
    InvertedBound { parameter: String, min: f64, max: f64 },
}
