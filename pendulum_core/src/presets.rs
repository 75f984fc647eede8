//! Named parameter sets applied through a single batch write.

use crate::params::Parameter;
use crate::state::{DEFAULT_GRAVITY, DEFAULT_MASS, DEFAULT_ROD_LENGTH, DEFAULT_THETA};
use std::f64::consts::{FRAC_PI_3, FRAC_PI_4, PI};

/// Preset identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    /// Default geometry, both rods released from horizontal
    Classic,

    /// Nearly inverted release, highly sensitive to initial conditions
    Chaotic,

    /// Second rod collapsed to zero length
    SingleRod,

    /// Second bob without mass: two uncoupled pendulums
    MasslessBob,

    /// Light upper bob, heavy lower bob
    HeavyLower,

    /// Lunar gravity
    Moon,
}

impl Preset {
    /// Returns a list of all presets.
    pub fn all() -> Vec<Preset> {
        vec![
            Preset::Classic,
            Preset::Chaotic,
            Preset::SingleRod,
            Preset::MasslessBob,
            Preset::HeavyLower,
            Preset::Moon,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Classic => "classic",
            Preset::Chaotic => "chaotic",
            Preset::SingleRod => "single_rod",
            Preset::MasslessBob => "massless_bob",
            Preset::HeavyLower => "heavy_lower",
            Preset::Moon => "moon",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Preset::Classic => "Default pendulum released from horizontal",
            Preset::Chaotic => "Both rods almost straight up, tiny offset between them",
            Preset::SingleRod => "Second rod has zero length, simple pendulum on rod 1",
            Preset::MasslessBob => "Second bob has zero mass, rods swing independently",
            Preset::HeavyLower => "Lower bob eight times heavier than the upper one",
            Preset::Moon => "Default pendulum under lunar gravity",
        }
    }

    /// Field values written by this preset, in application order.
    pub fn entries(&self) -> Vec<(Parameter, f64)> {
        let release = |theta_1: f64, theta_2: f64| {
            vec![
                (Parameter::Theta1, theta_1),
                (Parameter::Theta2, theta_2),
                (Parameter::Omega1, 0.0),
                (Parameter::Omega2, 0.0),
            ]
        };

        let mut entries = match self {
            Preset::Classic => vec![
                (Parameter::LengthRod1, DEFAULT_ROD_LENGTH),
                (Parameter::LengthRod2, DEFAULT_ROD_LENGTH),
                (Parameter::MassBob1, DEFAULT_MASS),
                (Parameter::MassBob2, DEFAULT_MASS),
                (Parameter::Gravity, DEFAULT_GRAVITY),
            ],
            Preset::Chaotic => vec![
                (Parameter::LengthRod1, DEFAULT_ROD_LENGTH),
                (Parameter::LengthRod2, DEFAULT_ROD_LENGTH),
            ],
            Preset::SingleRod => vec![(Parameter::LengthRod2, 0.0)],
            Preset::MasslessBob => vec![(Parameter::MassBob2, 0.0)],
            Preset::HeavyLower => vec![
                (Parameter::MassBob1, 5.0),
                (Parameter::MassBob2, 40.0),
            ],
            Preset::Moon => vec![(Parameter::Gravity, 1.62)],
        };

        entries.extend(match self {
            Preset::Classic | Preset::HeavyLower | Preset::Moon => {
                release(DEFAULT_THETA, DEFAULT_THETA)
            }
            Preset::Chaotic => release(PI - 0.01, PI),
            Preset::SingleRod => release(FRAC_PI_3, 0.0),
            Preset::MasslessBob => release(FRAC_PI_4, DEFAULT_THETA),
        });
        entries
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "classic" | "default" => Ok(Preset::Classic),
            "chaotic" => Ok(Preset::Chaotic),
            "single_rod" | "singlerod" | "single" => Ok(Preset::SingleRod),
            "massless_bob" | "masslessbob" => Ok(Preset::MasslessBob),
            "heavy_lower" | "heavylower" => Ok(Preset::HeavyLower),
            "moon" => Ok(Preset::Moon),
            _ => Err(format!("Unknown preset: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_names_parse_back() {
        for preset in Preset::all() {
            assert_eq!(preset.name().parse::<Preset>(), Ok(preset));
        }
        assert!("jupiter".parse::<Preset>().is_err());
    }

    #[test]
    fn test_preset_entries_are_valid() {
        for preset in Preset::all() {
            for (parameter, value) in preset.entries() {
                assert!(
                    parameter.validate(value).is_ok(),
                    "{} writes invalid {}={}",
                    preset,
                    parameter,
                    value
                );
            }
        }
    }

    #[test]
    fn test_every_preset_sets_initial_conditions() {
        for preset in Preset::all() {
            let entries = preset.entries();
            for parameter in [
                Parameter::Theta1,
                Parameter::Theta2,
                Parameter::Omega1,
                Parameter::Omega2,
            ] {
                assert!(entries.iter().any(|(p, _)| *p == parameter));
            }
        }
    }
}
