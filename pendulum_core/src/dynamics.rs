//! Equations of motion and the semi-implicit Euler step.
//!
//! Velocities are advanced from accelerations evaluated at the old angles,
//! then angles are advanced with the *new* velocities.
//!
//! Three regimes are selected from the current parameters on every call:
//!
//! | regime        | condition            | dynamics                          |
//! |---------------|----------------------|-----------------------------------|
//! | `SingleRod`   | `length_rod_2 == 0`  | rod 1 alone, bob 2 pinned to bob 1 |
//! | `MasslessBob` | `mass_bob_2 == 0`    | two uncoupled single pendulums    |
//! | `Coupled`     | otherwise            | full Euler-Lagrange two-link EOM  |
//!
//! Near-zero denominators in the coupled branch are not guarded up front.
//! Whatever the arithmetic produces is checked after the fact: a step whose
//! result contains NaN or infinity is reported as a [`StepFault`] and never
//! committed.

use crate::error::StepFault;
use crate::state::PendulumState;
use serde::{Deserialize, Serialize};

/// Which set of equations drives a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    SingleRod,
    MasslessBob,
    Coupled,
}

impl Regime {
    /// Classifies the state. The rod-length test takes precedence.
    pub fn classify(state: &PendulumState) -> Self {
        if state.length_rod_2 == 0.0 {
            Regime::SingleRod
        } else if state.mass_bob_2 == 0.0 {
            Regime::MasslessBob
        } else {
            Regime::Coupled
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Regime::SingleRod => "single_rod",
            Regime::MasslessBob => "massless_bob",
            Regime::Coupled => "coupled",
        }
    }
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Angular accelerations (rad/s²) of both rods.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accelerations {
    pub alpha_1: f64,
    pub alpha_2: f64,
}

/// Angular acceleration of an isolated simple pendulum.
#[inline]
fn simple_pendulum(g: f64, theta: f64, length: f64) -> f64 {
    -g * theta.sin() / length
}

/// Accelerations for the given regime, evaluated at the current state.
///
/// For `SingleRod` the second acceleration is reported as zero; rod 2 is
/// not integrated in that regime.
pub fn accelerations(state: &PendulumState, regime: Regime) -> Accelerations {
    match regime {
        Regime::SingleRod => Accelerations {
            alpha_1: simple_pendulum(state.g, state.theta_1, state.length_rod_1),
            alpha_2: 0.0,
        },
        Regime::MasslessBob => Accelerations {
            alpha_1: simple_pendulum(state.g, state.theta_1, state.length_rod_1),
            alpha_2: simple_pendulum(state.g, state.theta_2, state.length_rod_2),
        },
        Regime::Coupled => coupled_accelerations(state),
    }
}

/// Two-link pendulum equations of motion from `L = T - V`.
fn coupled_accelerations(state: &PendulumState) -> Accelerations {
    let PendulumState {
        length_rod_1: l1,
        length_rod_2: l2,
        mass_bob_1: m1,
        mass_bob_2: m2,
        g,
        theta_1,
        theta_2,
        omega_1: w1,
        omega_2: w2,
        ..
    } = *state;

    let total_mass = m1 + m2;
    let (sin_delta, cos_delta) = (theta_2 - theta_1).sin_cos();

    let denom_1 = total_mass * l1 - m2 * l1 * cos_delta * cos_delta;
    let denom_2 = (l2 / l1) * denom_1;

    let alpha_1 = (m2 * l1 * w1 * w1 * sin_delta * cos_delta
        + m2 * g * theta_2.sin() * cos_delta
        + m2 * l2 * w2 * w2 * sin_delta
        - total_mass * g * theta_1.sin())
        / denom_1;

    let alpha_2 = (-m2 * l2 * w2 * w2 * sin_delta * cos_delta
        + total_mass * g * theta_1.sin() * cos_delta
        - total_mass * l1 * w1 * w1 * sin_delta
        - total_mass * g * theta_2.sin())
        / denom_2;

    Accelerations { alpha_1, alpha_2 }
}

/// Computes the state one step of `dt` ahead without touching `state`.
///
/// Returns the regime used alongside the new state. Fails if `dt` is negative
/// or not finite, or if the result contains a non-finite angle, velocity or coordinate.
pub fn advance(state: &PendulumState, dt: f64) -> Result<(PendulumState, Regime), StepFault> {
    if !dt.is_finite() || dt < 0.0 {
        return Err(StepFault::InvalidTimeStep(dt));
    }

    let regime = Regime::classify(state);
    let Accelerations { alpha_1, alpha_2 } = accelerations(state, regime);
    let mut next = state.clone();

    next.omega_1 += alpha_1 * dt;
    next.theta_1 += next.omega_1 * dt;

    match regime {
        Regime::SingleRod => next.recompute_single_rod(),
        Regime::MasslessBob | Regime::Coupled => {
            next.omega_2 += alpha_2 * dt;
            next.theta_2 += next.omega_2 * dt;
            next.recompute_coordinates();
        }
    }

    if let Some(field) = next.first_non_finite() {
        return Err(StepFault::NonFinite { regime, field });
    }

    Ok((next, regime))
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn arb_state() -> impl Strategy<Value = PendulumState> {
        (
            (1.0..300.0_f64, 0.0..300.0_f64),
            (0.1..50.0_f64, 0.0..50.0_f64),
            0.0..30.0_f64,
            (-10.0..10.0_f64, -10.0..10.0_f64),
            (-3.0..3.0_f64, -3.0..3.0_f64),
        )
            .prop_map(|((l1, l2), (m1, m2), g, (t1, t2), (w1, w2))| {
                let mut state = PendulumState::default();
                state.length_rod_1 = l1;
                state.length_rod_2 = l2;
                state.mass_bob_1 = m1;
                state.mass_bob_2 = m2;
                state.g = g;
                state.theta_1 = t1;
                state.theta_2 = t2;
                state.omega_1 = w1;
                state.omega_2 = w2;
                state.recompute_coordinates();
                state
            })
    }

    fn assert_consistent(state: &PendulumState) -> Result<(), TestCaseError> {
        let x1 = state.origin.x + state.length_rod_1 * state.theta_1.sin();
        let y1 = state.origin.y + state.length_rod_1 * state.theta_1.cos();
        let x2 = x1 + state.length_rod_2 * state.theta_2.sin();
        let y2 = y1 + state.length_rod_2 * state.theta_2.cos();
        prop_assert!((state.bob_1().x - x1).abs() < EPS, "x_1 {} vs {}", state.bob_1().x, x1);
        prop_assert!((state.bob_1().y - y1).abs() < EPS, "y_1 {} vs {}", state.bob_1().y, y1);
        prop_assert!((state.bob_2().x - x2).abs() < EPS, "x_2 {} vs {}", state.bob_2().x, x2);
        prop_assert!((state.bob_2().y - y2).abs() < EPS, "y_2 {} vs {}", state.bob_2().y, y2);
        Ok(())
    }

    proptest! {
        #[test]
        fn zero_dt_is_identity(state in arb_state()) {
            if let Ok((next, _)) = advance(&state, 0.0) {
                prop_assert_eq!(next.theta_1, state.theta_1);
                prop_assert_eq!(next.theta_2, state.theta_2);
                prop_assert_eq!(next.omega_1, state.omega_1);
                prop_assert_eq!(next.omega_2, state.omega_2);
                prop_assert_eq!(next.bob_1(), state.bob_1());
                prop_assert_eq!(next.bob_2(), state.bob_2());
            }
        }

        #[test]
        fn step_keeps_coordinates_consistent(state in arb_state(), dt in 0.0..0.1_f64) {
            if let Ok((next, _)) = advance(&state, dt) {
                assert_consistent(&next)?;
            }
        }

        #[test]
        fn faulted_step_never_returns_state(state in arb_state(), dt in 0.0..0.1_f64) {
            match advance(&state, dt) {
                Ok((next, _)) => prop_assert!(next.first_non_finite().is_none()),
                Err(StepFault::NonFinite { .. }) => {}
                Err(other) => prop_assert!(false, "unexpected fault {:?}", other),
            }
        }
    }
}
