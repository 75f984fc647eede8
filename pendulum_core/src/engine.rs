//! The simulation engine: one pendulum behind one reader/writer lock.
//!
//! [`SimulationEngine`] is a cheap, cloneable handle. The background driver
//! and every facade caller hold their own clone; none of them ever sees the
//! raw state, only copies taken under the lock.
//!
//! Every mutation (step, write, batch, reset) builds its result and commits
//! it while holding the write guard, so readers observe either the old or
//! the new state and nothing in between.

use crate::dynamics::{self, Regime};
use crate::error::{ParameterError, StepFault};
use crate::params::Parameter;
use crate::presets::Preset;
use crate::state::{Coordinates, EnergyReport, PendulumState};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Physics time step used by the background driver.
pub const DEFAULT_DT: f64 = 0.06;

#[derive(Debug, Default)]
struct Simulation {
    state: PendulumState,

    /// Successful steps since construction or last reset
    steps: u64,

    /// Bumped on every accepted external write and on reset
    revision: u64,
}

/// Outcome of a committed step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepReport {
    pub regime: Regime,

    /// Step counter after this step
    pub step: u64,
}

/// A consistent copy of everything the engine knows, taken under one read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub state: PendulumState,
    pub coordinates: Coordinates,
    pub energy: EnergyReport,
    pub regime: Regime,
    pub steps: u64,
    pub revision: u64,
}

/// Result of a batch write. Applied fields are never rolled back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub applied: Vec<Parameter>,
    pub errors: Vec<ParameterError>,
}

impl BatchOutcome {
    /// True when every entry of the batch was applied.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// True when some, but not all, entries were applied.
    pub fn is_partial(&self) -> bool {
        !self.applied.is_empty() && !self.errors.is_empty()
    }
}

/// Shared handle to the single running simulation.
#[derive(Debug, Clone, Default)]
pub struct SimulationEngine {
    inner: Arc<RwLock<Simulation>>,
}

impl SimulationEngine {
    /// Creates an engine holding the default pendulum.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine from an explicit starting state.
    pub fn with_state(mut state: PendulumState) -> Self {
        state.recompute_coordinates();
        Self {
            inner: Arc::new(RwLock::new(Simulation {
                state,
                ..Default::default()
            })),
        }
    }

    // Every commit is a whole-value assignment, so a poisoned lock still
    // guards a consistent state.
    fn read(&self) -> RwLockReadGuard<'_, Simulation> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Simulation> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advances the simulation by `dt`.
    ///
    /// On fault nothing is committed; readers keep seeing the last good state.
    pub fn step(&self, dt: f64) -> Result<StepReport, StepFault> {
        let mut sim = self.write();
        let (next, regime) = dynamics::advance(&sim.state, dt)?;
        sim.state = next;
        sim.steps += 1;
        Ok(StepReport {
            regime,
            step: sim.steps,
        })
    }

    pub fn coordinates(&self) -> Coordinates {
        self.read().state.coordinates()
    }

    pub fn energy(&self) -> EnergyReport {
        self.read().state.energy()
    }

    /// Every parameter, dynamic field, coordinate and energy term at once.
    pub fn full_state(&self) -> Snapshot {
        let sim = self.read();
        Snapshot {
            coordinates: sim.state.coordinates(),
            energy: sim.state.energy(),
            regime: Regime::classify(&sim.state),
            steps: sim.steps,
            revision: sim.revision,
            state: sim.state.clone(),
        }
    }

    /// Current value of one field.
    pub fn parameter(&self, parameter: Parameter) -> f64 {
        parameter.get(&self.read().state)
    }

    pub fn revision(&self) -> u64 {
        self.read().revision
    }

    /// Validated write of a single field addressed by name.
    pub fn set_parameter(&self, name: &str, value: f64) -> Result<Parameter, ParameterError> {
        let parameter: Parameter = name.parse()?;
        self.set(parameter, value)?;
        Ok(parameter)
    }

    /// Validated write of a single typed field.
    pub fn set(&self, parameter: Parameter, value: f64) -> Result<(), ParameterError> {
        let mut sim = self.write();
        parameter.apply(&mut sim.state, value)?;
        sim.revision += 1;
        Ok(())
    }

    /// Applies every valid entry, skipping and reporting the invalid ones.
    ///
    /// Coordinates are recomputed once at the end if any entry names a field
    /// that moves the bobs, whether or not that entry was accepted.
    pub fn set_many_parameters<I, S>(&self, entries: I) -> BatchOutcome
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut outcome = BatchOutcome::default();
        let mut touches_coordinates = false;
        let mut sim = self.write();

        for (name, value) in entries {
            let parsed = name
                .as_ref()
                .parse::<Parameter>()
                .and_then(|p| p.validate(value).map(|_| p));

            match parsed {
                Ok(parameter) => {
                    touches_coordinates |= parameter.affects_coordinates();
                    parameter.write(&mut sim.state, value);
                    outcome.applied.push(parameter);
                }
                Err(err) => {
                    if let Ok(parameter) = name.as_ref().parse::<Parameter>() {
                        touches_coordinates |= parameter.affects_coordinates();
                    }
                    outcome.errors.push(err);
                }
            }
        }

        if touches_coordinates {
            sim.state.recompute_coordinates();
        }
        if !outcome.applied.is_empty() {
            sim.revision += 1;
        }
        outcome
    }

    /// Applies a named preset as one batch.
    pub fn apply_preset(&self, preset: Preset) -> BatchOutcome {
        self.set_many_parameters(
            preset
                .entries()
                .into_iter()
                .map(|(parameter, value)| (parameter.name(), value)),
        )
    }

    /// Replaces the whole state with fresh defaults.
    pub fn reset(&self) {
        let mut sim = self.write();
        let revision = sim.revision + 1;
        *sim = Simulation {
            revision,
            ..Default::default()
        };
    }
}
