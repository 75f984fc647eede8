//! Energy drift monitoring for the integrator.
//!
//! Semi-implicit Euler does not conserve energy exactly. The monitor
//! measures how far total energy has wandered from a baseline so the driver
//! and the harness can report it; nothing here corrects the drift.

use crate::engine::Snapshot;
use crate::state::PendulumState;

/// Characteristic energy of the pendulum: `(m1 + m2) * g * (L1 + L2)`.
///
/// Used to normalize drift, since the total energy itself can sit at zero
/// (e.g. both rods horizontal at rest).
pub fn energy_scale(state: &PendulumState) -> f64 {
    (state.mass_bob_1 + state.mass_bob_2) * state.g * (state.length_rod_1 + state.length_rod_2)
}

/// Tracks total-energy drift against a baseline.
#[derive(Debug, Clone)]
pub struct EnergyMonitor {
    baseline_energy: f64,
    scale: f64,

    /// Engine revision the baseline belongs to
    revision: u64,

    max_drift: f64,
    samples: u64,
}

impl EnergyMonitor {
    /// Takes the baseline from `snapshot`.
    pub fn new(snapshot: &Snapshot) -> Self {
        Self {
            baseline_energy: snapshot.energy.total,
            scale: energy_scale(&snapshot.state),
            revision: snapshot.revision,
            max_drift: 0.0,
            samples: 0,
        }
    }

    /// Normalized drift `|E - E0| / scale` (absolute when the scale is zero).
    ///
    /// An external write or reset changes the revision; the monitor then
    /// re-baselines on `snapshot` and reports zero.
    pub fn observe(&mut self, snapshot: &Snapshot) -> f64 {
        if snapshot.revision != self.revision {
            *self = Self::new(snapshot);
            return 0.0;
        }

        let delta = (snapshot.energy.total - self.baseline_energy).abs();
        let drift = if self.scale.abs() > 1e-12 {
            delta / self.scale.abs()
        } else {
            delta
        };

        self.samples += 1;
        self.max_drift = self.max_drift.max(drift);
        drift
    }

    pub fn baseline_energy(&self) -> f64 {
        self.baseline_energy
    }

    /// Largest drift seen since the last baseline.
    pub fn max_drift(&self) -> f64 {
        self.max_drift
    }

    /// Observations since the last baseline.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// True when drift since the last baseline stayed within `tolerance`.
    pub fn within(&self, tolerance: f64) -> bool {
        self.max_drift <= tolerance
    }
}
