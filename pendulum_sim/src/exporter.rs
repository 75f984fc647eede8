//! JSON exporter for offline plotting of a run.

use pendulum_core::facade::BobPosition;
use pendulum_core::{EnergyReport, Snapshot};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Virtual wall-clock time in seconds
    pub time_sec: f64,

    /// Engine step counter
    pub step: u64,

    pub regime: String,
    pub bob_1: BobPosition,
    pub bob_2: BobPosition,
    pub energy: EnergyReport,
}

impl SimFrame {
    pub fn from_snapshot(time_sec: f64, snapshot: &Snapshot) -> Self {
        Self {
            time_sec,
            step: snapshot.steps,
            regime: snapshot.regime.name().to_string(),
            bob_1: snapshot.coordinates.bob_1.into(),
            bob_2: snapshot.coordinates.bob_2.into(),
            energy: snapshot.energy,
        }
    }
}

/// Complete run export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Duration in seconds
    pub duration_sec: f64,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_energy_drift: Option<f64>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_sec: 0.0,
            frames: Vec::new(),
            passed: false,
            max_energy_drift: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, max_energy_drift: Option<f64>) {
        self.passed = passed;
        self.max_energy_drift = max_energy_drift;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
