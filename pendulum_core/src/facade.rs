//! Request/response records for the (external) web facade.
//!
//! Transport and routing live outside this crate. What lives here is the
//! contract: each inbound request becomes one engine call, and each answer
//! is a serde record with the field names browser clients already read.

use crate::engine::{BatchOutcome, SimulationEngine};
use crate::error::ParameterError;
use crate::presets::Preset;
use crate::state::EnergyReport;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// A bob position as `{"x": .., "y": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BobPosition {
    pub x: f64,
    pub y: f64,
}

impl From<Point2<f64>> for BobPosition {
    fn from(p: Point2<f64>) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// Full state record for the `/state` view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateResponse {
    pub origin_x: f64,
    pub origin_y: f64,
    pub length_rod_1: f64,
    pub length_rod_2: f64,
    pub mass_rod_1: f64,
    pub mass_rod_2: f64,
    pub mass_bob_1: f64,
    pub mass_bob_2: f64,
    pub g: f64,
    pub theta_1: f64,
    pub theta_2: f64,
    pub omega_1: f64,
    pub omega_2: f64,
    pub coords: [BobPosition; 2],
    pub energy: EnergyReport,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateParameterRequest {
    pub parameter: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateConditionRequest {
    pub condition: String,
    pub value: f64,
}

/// Body of a preset request: field name to value.
pub type PresetRequest = BTreeMap<String, f64>;

/// Answer to a single-field write.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UpdateResponse {
    Parameter {
        success: bool,
        parameter: String,
        value: f64,
    },
    Condition {
        success: bool,
        condition: String,
        value: f64,
    },
    Rejected {
        success: bool,
        error: String,
    },
}

impl UpdateResponse {
    fn rejected(error: impl std::fmt::Display) -> Self {
        UpdateResponse::Rejected {
            success: false,
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, UpdateResponse::Rejected { .. })
    }
}

/// Answer to a batch write.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PresetResponse {
    Applied {
        success: bool,
        parameters: Vec<String>,
    },
    Partial {
        success: bool,
        errors: Vec<String>,
        updated: Vec<String>,
    },
}

impl PresetResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, PresetResponse::Applied { .. })
    }
}

impl From<BatchOutcome> for PresetResponse {
    fn from(outcome: BatchOutcome) -> Self {
        let applied = outcome
            .applied
            .iter()
            .map(|p| p.name().to_string())
            .collect();

        if outcome.is_complete() {
            PresetResponse::Applied {
                success: true,
                parameters: applied,
            }
        } else {
            PresetResponse::Partial {
                success: false,
                errors: outcome.errors.iter().map(|e| e.to_string()).collect(),
                updated: applied,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResetResponse {
    pub success: bool,
    pub message: String,
}

/// Translates facade requests into engine reads and writes.
#[derive(Debug, Clone)]
pub struct SimulationFacade {
    engine: SimulationEngine,
}

impl SimulationFacade {
    pub fn new(engine: SimulationEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    pub fn coords(&self) -> [BobPosition; 2] {
        let coords = self.engine.coordinates();
        [coords.bob_1.into(), coords.bob_2.into()]
    }

    pub fn energy(&self) -> EnergyReport {
        self.engine.energy()
    }

    pub fn state(&self) -> StateResponse {
        let snapshot = self.engine.full_state();
        let s = &snapshot.state;
        StateResponse {
            origin_x: s.origin.x,
            origin_y: s.origin.y,
            length_rod_1: s.length_rod_1,
            length_rod_2: s.length_rod_2,
            mass_rod_1: s.mass_rod_1,
            mass_rod_2: s.mass_rod_2,
            mass_bob_1: s.mass_bob_1,
            mass_bob_2: s.mass_bob_2,
            g: s.g,
            theta_1: s.theta_1,
            theta_2: s.theta_2,
            omega_1: s.omega_1,
            omega_2: s.omega_2,
            coords: [
                snapshot.coordinates.bob_1.into(),
                snapshot.coordinates.bob_2.into(),
            ],
            energy: snapshot.energy,
        }
    }

    pub fn update_parameter(&self, request: UpdateParameterRequest) -> UpdateResponse {
        match self.engine.set_parameter(&request.parameter, request.value) {
            Ok(parameter) => UpdateResponse::Parameter {
                success: true,
                parameter: parameter.name().to_string(),
                value: request.value,
            },
            Err(err) => UpdateResponse::rejected(err),
        }
    }

    /// Same validated write as [`update_parameter`](Self::update_parameter),
    /// answered under the `condition` key.
    pub fn update_initial_condition(&self, request: UpdateConditionRequest) -> UpdateResponse {
        match self.engine.set_parameter(&request.condition, request.value) {
            Ok(parameter) => UpdateResponse::Condition {
                success: true,
                condition: parameter.name().to_string(),
                value: request.value,
            },
            Err(ParameterError::UnknownField(name)) => {
                UpdateResponse::rejected(format!("Condition {} not found", name))
            }
            Err(err) => UpdateResponse::rejected(err),
        }
    }

    pub fn update_preset(&self, request: PresetRequest) -> PresetResponse {
        self.engine.set_many_parameters(request).into()
    }

    pub fn apply_preset(&self, preset: Preset) -> PresetResponse {
        info!(preset = %preset, "applying preset");
        self.engine.apply_preset(preset).into()
    }

    pub fn reset_simulation(&self) -> ResetResponse {
        self.engine.reset();
        info!("simulation reset to defaults");
        ResetResponse {
            success: true,
            message: "Simulation reset to defaults".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn facade() -> SimulationFacade {
        SimulationFacade::new(SimulationEngine::new())
    }

    #[test]
    fn test_coords_shape() {
        let value = serde_json::to_value(facade().coords()).unwrap();
        let arr = value.as_array().unwrap();

        assert_eq!(arr.len(), 2);
        assert!(arr[0].get("x").is_some());
        assert!(arr[1].get("y").is_some());
    }

    #[test]
    fn test_energy_shape() {
        let value = serde_json::to_value(facade().energy()).unwrap();
        for key in ["kinetic", "potential", "total"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_state_shape() {
        let value = serde_json::to_value(facade().state()).unwrap();
        for key in [
            "origin_x", "origin_y", "length_rod_1", "length_rod_2", "mass_rod_1",
            "mass_rod_2", "mass_bob_1", "mass_bob_2", "g", "theta_1", "theta_2",
            "omega_1", "omega_2", "coords", "energy",
        ] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(value["g"], json!(9.81));
        assert_eq!(value["coords"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_update_parameter_success() {
        let facade = facade();
        let request: UpdateParameterRequest =
            serde_json::from_value(json!({"parameter": "mass_bob_2", "value": 4.0})).unwrap();

        let response = facade.update_parameter(request);

        assert!(response.is_success());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"success": true, "parameter": "mass_bob_2", "value": 4.0})
        );
        assert_eq!(facade.state().mass_bob_2, 4.0);
    }

    #[test]
    fn test_update_parameter_rejected() {
        let facade = facade();
        let response = facade.update_parameter(UpdateParameterRequest {
            parameter: "g".into(),
            value: -1.0,
        });

        assert!(!response.is_success());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"success": false, "error": "Gravity cannot be negative"})
        );
        assert_eq!(facade.state().g, 9.81);
    }

    #[test]
    fn test_update_initial_condition() {
        let facade = facade();
        let response = facade.update_initial_condition(UpdateConditionRequest {
            condition: "omega_1".into(),
            value: -2.5,
        });

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"success": true, "condition": "omega_1", "value": -2.5})
        );
        assert_eq!(facade.state().omega_1, -2.5);
    }

    #[test]
    fn test_update_initial_condition_unknown_name() {
        let facade = facade();
        let before = facade.state();
        let response = facade.update_initial_condition(UpdateConditionRequest {
            condition: "phi_3".into(),
            value: 1.0,
        });

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"success": false, "error": "Condition phi_3 not found"})
        );
        assert_eq!(facade.state(), before);
    }

    #[test]
    fn test_update_preset_partial() {
        let facade = facade();
        let request: PresetRequest =
            serde_json::from_value(json!({"mass_bob_1": 5.0, "length_rod_1": -10.0})).unwrap();

        let response = facade.update_preset(request);

        assert!(!response.is_success());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "success": false,
                "errors": ["Parameter length_rod_1 cannot be negative"],
                "updated": ["mass_bob_1"],
            })
        );
        let state = facade.state();
        assert_eq!(state.mass_bob_1, 5.0);
        assert_eq!(state.length_rod_1, 120.0);
    }

    #[test]
    fn test_apply_named_preset() {
        let facade = facade();
        let response = facade.apply_preset(Preset::SingleRod);

        assert!(response.is_success());
        let state = facade.state();
        assert_eq!(state.length_rod_2, 0.0);
        assert_eq!(state.coords[0], state.coords[1]);
    }

    #[test]
    fn test_reset_simulation() {
        let facade = facade();
        facade.update_parameter(UpdateParameterRequest {
            parameter: "theta_2".into(),
            value: 0.1,
        });

        let response = facade.reset_simulation();

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"success": true, "message": "Simulation reset to defaults"})
        );
        assert_eq!(facade.state().theta_2, std::f64::consts::FRAC_PI_2);
    }
}
