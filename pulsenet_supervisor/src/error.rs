use pulsenet_core::{CoreError, Parameter};
use thiserror::Error;

/// Errors from the supervisor.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SupervisorError {
    #[error("invalid supervisor configuration: {0}")]
    InvalidConfig(String),

    #[error("non-finite trust delta {delta} rejected")]
    NonFiniteDelta { delta: f64 },

    #[error("no safe bound configured for parameter {0}")]
    MissingBound(Parameter),

    #[error(transparent)]
    Core(#[from] CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SupervisorError::MissingBound(Parameter::DecayFactor);
        assert!(err.to_string().contains("decayFactor"));

        let err: SupervisorError = CoreError::UnknownParameter("gain".into()).into();
        assert!(err.to_string().contains("gain"));
    }
}
