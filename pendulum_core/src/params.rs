//! Writable pendulum fields, addressed by name.
//!
//! The set of names is closed: anything outside [`Parameter::ALL`] is
//! rejected when parsing, before any state is touched.

use crate::error::ParameterError;
use crate::state::PendulumState;
use serde::{Deserialize, Serialize};

/// Derived coordinate names. Recognized, but never writable.
pub const DERIVED_FIELDS: [&str; 4] = ["x_1", "y_1", "x_2", "y_2"];

/// A writable attribute of [`PendulumState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parameter {
    #[serde(rename = "origin_x")]
    OriginX,
    #[serde(rename = "origin_y")]
    OriginY,
    #[serde(rename = "length_rod_1")]
    LengthRod1,
    #[serde(rename = "length_rod_2")]
    LengthRod2,
    #[serde(rename = "mass_rod_1")]
    MassRod1,
    #[serde(rename = "mass_rod_2")]
    MassRod2,
    #[serde(rename = "mass_bob_1")]
    MassBob1,
    #[serde(rename = "mass_bob_2")]
    MassBob2,
    #[serde(rename = "g")]
    Gravity,
    #[serde(rename = "theta_1")]
    Theta1,
    #[serde(rename = "theta_2")]
    Theta2,
    #[serde(rename = "omega_1")]
    Omega1,
    #[serde(rename = "omega_2")]
    Omega2,
}

impl Parameter {
    pub const ALL: [Parameter; 13] = [
        Parameter::OriginX,
        Parameter::OriginY,
        Parameter::LengthRod1,
        Parameter::LengthRod2,
        Parameter::MassRod1,
        Parameter::MassRod2,
        Parameter::MassBob1,
        Parameter::MassBob2,
        Parameter::Gravity,
        Parameter::Theta1,
        Parameter::Theta2,
        Parameter::Omega1,
        Parameter::Omega2,
    ];

    /// Returns the field name as clients spell it.
    pub fn name(&self) -> &'static str {
        match self {
            Parameter::OriginX => "origin_x",
            Parameter::OriginY => "origin_y",
            Parameter::LengthRod1 => "length_rod_1",
            Parameter::LengthRod2 => "length_rod_2",
            Parameter::MassRod1 => "mass_rod_1",
            Parameter::MassRod2 => "mass_rod_2",
            Parameter::MassBob1 => "mass_bob_1",
            Parameter::MassBob2 => "mass_bob_2",
            Parameter::Gravity => "g",
            Parameter::Theta1 => "theta_1",
            Parameter::Theta2 => "theta_2",
            Parameter::Omega1 => "omega_1",
            Parameter::Omega2 => "omega_2",
        }
    }

    /// Lengths, masses and gravity must stay non-negative.
    pub fn requires_non_negative(&self) -> bool {
        matches!(
            self,
            Parameter::LengthRod1
                | Parameter::LengthRod2
                | Parameter::MassRod1
                | Parameter::MassRod2
                | Parameter::MassBob1
                | Parameter::MassBob2
                | Parameter::Gravity
        )
    }

    /// Writing this field moves the bobs, so coordinates must be recomputed.
    pub fn affects_coordinates(&self) -> bool {
        matches!(
            self,
            Parameter::OriginX
                | Parameter::OriginY
                | Parameter::LengthRod1
                | Parameter::LengthRod2
                | Parameter::Theta1
                | Parameter::Theta2
        )
    }

    /// Checks `value` without touching any state.
    pub fn validate(&self, value: f64) -> Result<(), ParameterError> {
        if !value.is_finite() {
            return Err(ParameterError::NonFinite(*self));
        }
        if self.requires_non_negative() && value < 0.0 {
            return Err(match self {
                Parameter::Gravity => ParameterError::NegativeGravity,
                other => ParameterError::Negative(*other),
            });
        }
        Ok(())
    }

    /// Reads the field from `state`.
    pub fn get(&self, state: &PendulumState) -> f64 {
        match self {
            Parameter::OriginX => state.origin.x,
            Parameter::OriginY => state.origin.y,
            Parameter::LengthRod1 => state.length_rod_1,
            Parameter::LengthRod2 => state.length_rod_2,
            Parameter::MassRod1 => state.mass_rod_1,
            Parameter::MassRod2 => state.mass_rod_2,
            Parameter::MassBob1 => state.mass_bob_1,
            Parameter::MassBob2 => state.mass_bob_2,
            Parameter::Gravity => state.g,
            Parameter::Theta1 => state.theta_1,
            Parameter::Theta2 => state.theta_2,
            Parameter::Omega1 => state.omega_1,
            Parameter::Omega2 => state.omega_2,
        }
    }

    /// Writes the raw field. Does not validate or recompute coordinates.
    pub(crate) fn write(&self, state: &mut PendulumState, value: f64) {
        let slot = match self {
            Parameter::OriginX => &mut state.origin.x,
            Parameter::OriginY => &mut state.origin.y,
            Parameter::LengthRod1 => &mut state.length_rod_1,
            Parameter::LengthRod2 => &mut state.length_rod_2,
            Parameter::MassRod1 => &mut state.mass_rod_1,
            Parameter::MassRod2 => &mut state.mass_rod_2,
            Parameter::MassBob1 => &mut state.mass_bob_1,
            Parameter::MassBob2 => &mut state.mass_bob_2,
            Parameter::Gravity => &mut state.g,
            Parameter::Theta1 => &mut state.theta_1,
            Parameter::Theta2 => &mut state.theta_2,
            Parameter::Omega1 => &mut state.omega_1,
            Parameter::Omega2 => &mut state.omega_2,
        };
        *slot = value;
    }

    /// Validates and writes, recomputing coordinates when needed.
    pub fn apply(&self, state: &mut PendulumState, value: f64) -> Result<(), ParameterError> {
        self.validate(value)?;
        self.write(state, value);
        if self.affects_coordinates() {
            state.recompute_coordinates();
        }
        Ok(())
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Parameter {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(parameter) = Parameter::ALL.iter().find(|p| p.name() == s) {
            return Ok(*parameter);
        }
        if DERIVED_FIELDS.contains(&s) {
            return Err(ParameterError::ReadOnly(s.to_string()));
        }
        Err(ParameterError::UnknownField(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip_names() {
        for parameter in Parameter::ALL {
            assert_eq!(parameter.name().parse::<Parameter>(), Ok(parameter));
        }
    }

    #[test]
    fn test_parse_rejects_unknown_and_derived() {
        assert_eq!(
            "not_a_field".parse::<Parameter>(),
            Err(ParameterError::UnknownField("not_a_field".into()))
        );
        assert_eq!(
            "y_1".parse::<Parameter>(),
            Err(ParameterError::ReadOnly("y_1".into()))
        );
        // Names are case sensitive
        assert!("Theta_1".parse::<Parameter>().is_err());
    }

    #[test]
    fn test_validate_non_negative_fields() {
        assert_eq!(
            Parameter::Gravity.validate(-1.0),
            Err(ParameterError::NegativeGravity)
        );
        assert_eq!(
            Parameter::MassRod2.validate(-0.5),
            Err(ParameterError::Negative(Parameter::MassRod2))
        );
        assert!(Parameter::LengthRod2.validate(0.0).is_ok());

        // Angles, velocities and the origin may be negative
        assert!(Parameter::Theta1.validate(-7.0).is_ok());
        assert!(Parameter::Omega2.validate(-3.0).is_ok());
        assert!(Parameter::OriginY.validate(-40.0).is_ok());
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        assert_eq!(
            Parameter::Theta1.validate(f64::NAN),
            Err(ParameterError::NonFinite(Parameter::Theta1))
        );
        assert_eq!(
            Parameter::Gravity.validate(f64::INFINITY),
            Err(ParameterError::NonFinite(Parameter::Gravity))
        );
    }

    #[test]
    fn test_apply_recomputes_coordinates() {
        let mut state = PendulumState::default();
        Parameter::Theta1.apply(&mut state, 0.0).unwrap();

        assert_eq!(state.theta_1, 0.0);
        assert!((state.bob_1().x - 300.0).abs() < 1e-9);
        assert!((state.bob_1().y - 220.0).abs() < 1e-9);

        Parameter::OriginX.apply(&mut state, 100.0).unwrap();
        assert!((state.bob_1().x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_apply_rejected_leaves_state() {
        let mut state = PendulumState::default();
        let before = state.clone();

        assert!(Parameter::LengthRod1.apply(&mut state, -10.0).is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn test_get_matches_write() {
        let mut state = PendulumState::default();
        for (i, parameter) in Parameter::ALL.iter().enumerate() {
            parameter.write(&mut state, i as f64 + 0.5);
        }
        for (i, parameter) in Parameter::ALL.iter().enumerate() {
            assert_eq!(parameter.get(&state), i as f64 + 0.5);
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Parameter::Gravity).unwrap();
        assert_eq!(json, "\"g\"");
        let json = serde_json::to_string(&Parameter::LengthRod1).unwrap();
        assert_eq!(json, "\"length_rod_1\"");
    }
}
