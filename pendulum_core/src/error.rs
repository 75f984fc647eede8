//! Error types for parameter writes and integration steps.

use crate::dynamics::Regime;
use crate::params::Parameter;
use thiserror::Error;

/// Rejected parameter writes. The state is never mutated for a rejected field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("Parameter {0} not found")]
    UnknownField(String),

    #[error("Parameter {0} is derived and cannot be set")]
    ReadOnly(String),

    #[error("Gravity cannot be negative")]
    NegativeGravity,

    #[error("Parameter {0} cannot be negative")]
    Negative(Parameter),

    #[error("Parameter {0} must be a finite number")]
    NonFinite(Parameter),
}

impl ParameterError {
    /// The field name the error refers to.
    pub fn field(&self) -> &str {
        match self {
            ParameterError::UnknownField(name) | ParameterError::ReadOnly(name) => name,
            ParameterError::NegativeGravity => Parameter::Gravity.name(),
            ParameterError::Negative(p) | ParameterError::NonFinite(p) => p.name(),
        }
    }
}

/// A step that could not be committed. The previous state stays in place.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepFault {
    #[error("Invalid time step: {0}")]
    InvalidTimeStep(f64),

    #[error("{regime} step produced a non-finite {field}")]
    NonFinite { regime: Regime, field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_error_messages() {
        assert_eq!(
            ParameterError::UnknownField("not_a_field".into()).to_string(),
            "Parameter not_a_field not found"
        );
        assert_eq!(
            ParameterError::Negative(Parameter::LengthRod1).to_string(),
            "Parameter length_rod_1 cannot be negative"
        );
        assert_eq!(ParameterError::NegativeGravity.to_string(), "Gravity cannot be negative");
        assert_eq!(
            ParameterError::ReadOnly("x_2".into()).to_string(),
            "Parameter x_2 is derived and cannot be set"
        );
    }

    #[test]
    fn test_parameter_error_field() {
        assert_eq!(ParameterError::NegativeGravity.field(), "g");
        assert_eq!(ParameterError::Negative(Parameter::MassBob2).field(), "mass_bob_2");
        assert_eq!(ParameterError::UnknownField("foo".into()).field(), "foo");
    }

    #[test]
    fn test_step_fault_message() {
        let fault = StepFault::NonFinite {
            regime: Regime::Coupled,
            field: "omega_1",
        };
        assert_eq!(fault.to_string(), "coupled step produced a non-finite omega_1");
    }
}
