//! Integration scenarios run by the headless harness.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// SIM-001: total energy stays near its starting value
    EnergyDrift,

    /// SIM-002: zero-length second rod keeps bob 2 on bob 1
    SingleRod,

    /// SIM-003: massless second bob swings independently of rod 1
    MasslessBob,

    /// SIM-004: degenerate first rod faults every tick without killing the loop
    ZeroLengthFault,

    /// SIM-005: reset mid-run restores defaults and stepping resumes
    ResetRecovery,

    /// SIM-006: readers, writers and the driver hammer the engine at once
    ConcurrentLoad,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::EnergyDrift,
            ScenarioId::SingleRod,
            ScenarioId::MasslessBob,
            ScenarioId::ZeroLengthFault,
            ScenarioId::ResetRecovery,
            ScenarioId::ConcurrentLoad,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::EnergyDrift => "energy_drift",
            ScenarioId::SingleRod => "single_rod",
            ScenarioId::MasslessBob => "massless_bob",
            ScenarioId::ZeroLengthFault => "zero_length_fault",
            ScenarioId::ResetRecovery => "reset_recovery",
            ScenarioId::ConcurrentLoad => "concurrent_load",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::EnergyDrift => "Small-swing release, energy drift under tolerance",
            ScenarioId::SingleRod => "length_rod_2 = 0, bob 2 pinned to bob 1 after every step",
            ScenarioId::MasslessBob => "mass_bob_2 = 0, uncoupled rods, bob 2 hangs off bob 1",
            ScenarioId::ZeroLengthFault => "length_rod_1 = 0, every step faults, state untouched",
            ScenarioId::ResetRecovery => "Random writes, reset, defaults restored, stepping resumes",
            ScenarioId::ConcurrentLoad => "Driver + writers + readers, no torn snapshots",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "energy_drift" | "energydrift" | "sim-001" => Ok(ScenarioId::EnergyDrift),
            "single_rod" | "singlerod" | "sim-002" => Ok(ScenarioId::SingleRod),
            "massless_bob" | "masslessbob" | "sim-003" => Ok(ScenarioId::MasslessBob),
            "zero_length_fault" | "zerolengthfault" | "sim-004" => Ok(ScenarioId::ZeroLengthFault),
            "reset_recovery" | "resetrecovery" | "sim-005" => Ok(ScenarioId::ResetRecovery),
            "concurrent_load" | "concurrentload" | "sim-006" => Ok(ScenarioId::ConcurrentLoad),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
