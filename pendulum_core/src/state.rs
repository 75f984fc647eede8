//! Pendulum state: parameters, dynamic variables and derived coordinates.
//!
//! Display coordinates are used throughout: `y` grows downward, angles are
//! measured from the downward vertical, so a bob hanging straight down sits
//! at `origin + (0, length)`.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

pub const DEFAULT_ORIGIN_X: f64 = 300.0;
pub const DEFAULT_ORIGIN_Y: f64 = 100.0;
pub const DEFAULT_ROD_LENGTH: f64 = 120.0;
pub const DEFAULT_MASS: f64 = 10.0;
pub const DEFAULT_GRAVITY: f64 = 9.81;
pub const DEFAULT_THETA: f64 = FRAC_PI_2;

/// Offset of a rod's free end from its anchor for a rod of `length` at
/// angle `theta` from the downward vertical.
#[inline]
pub fn rod_offset(length: f64, theta: f64) -> Vector2<f64> {
    let (sin, cos) = theta.sin_cos();
    Vector2::new(length * sin, length * cos)
}

/// The full physical state of the double pendulum.
///
/// Rod masses are carried for completeness only; the equations of motion
/// treat both rods as massless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendulumState {
    /// Pivot location (display coordinates)
    pub origin: Point2<f64>,

    pub length_rod_1: f64,
    pub length_rod_2: f64,
    pub mass_rod_1: f64,
    pub mass_rod_2: f64,
    pub mass_bob_1: f64,
    pub mass_bob_2: f64,

    /// Gravitational acceleration
    pub g: f64,

    /// Angle of rod 1 from vertical (radians, unwrapped)
    pub theta_1: f64,
    /// Angle of rod 2 from vertical (radians, unwrapped)
    pub theta_2: f64,
    /// Angular velocity of rod 1 (rad/s)
    pub omega_1: f64,
    /// Angular velocity of rod 2 (rad/s)
    pub omega_2: f64,

    /// Derived: first bob position
    pub(crate) bob_1: Point2<f64>,
    /// Derived: second bob position
    pub(crate) bob_2: Point2<f64>,
}

impl Default for PendulumState {
    fn default() -> Self {
        let mut state = Self {
            origin: Point2::new(DEFAULT_ORIGIN_X, DEFAULT_ORIGIN_Y),
            length_rod_1: DEFAULT_ROD_LENGTH,
            length_rod_2: DEFAULT_ROD_LENGTH,
            mass_rod_1: DEFAULT_MASS,
            mass_rod_2: DEFAULT_MASS,
            mass_bob_1: DEFAULT_MASS,
            mass_bob_2: DEFAULT_MASS,
            g: DEFAULT_GRAVITY,
            theta_1: DEFAULT_THETA,
            theta_2: DEFAULT_THETA,
            omega_1: 0.0,
            omega_2: 0.0,
            bob_1: Point2::origin(),
            bob_2: Point2::origin(),
        };
        state.recompute_coordinates();
        state
    }
}

impl PendulumState {
    /// Recomputes both bob positions from origin, rod lengths and angles.
    pub fn recompute_coordinates(&mut self) {
        self.bob_1 = self.origin + rod_offset(self.length_rod_1, self.theta_1);
        self.bob_2 = self.bob_1 + rod_offset(self.length_rod_2, self.theta_2);
    }

    /// Recomputes bob 1 only and pins bob 2 onto it (zero-length second rod).
    pub(crate) fn recompute_single_rod(&mut self) {
        self.bob_1 = self.origin + rod_offset(self.length_rod_1, self.theta_1);
        self.bob_2 = self.bob_1;
    }

    pub fn bob_1(&self) -> Point2<f64> {
        self.bob_1
    }

    pub fn bob_2(&self) -> Point2<f64> {
        self.bob_2
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            bob_1: self.bob_1,
            bob_2: self.bob_2,
        }
    }

    /// Kinetic, potential and total mechanical energy of the current state.
    ///
    /// Heights are measured upward from the pivot, so `h = -(y - origin_y)`.
    pub fn energy(&self) -> EnergyReport {
        let v1 = Vector2::new(
            self.omega_1 * self.length_rod_1 * self.theta_1.cos(),
            -self.omega_1 * self.length_rod_1 * self.theta_1.sin(),
        );
        let v2 = v1
            + Vector2::new(
                self.omega_2 * self.length_rod_2 * self.theta_2.cos(),
                -self.omega_2 * self.length_rod_2 * self.theta_2.sin(),
            );

        let kinetic =
            0.5 * self.mass_bob_1 * v1.norm_squared() + 0.5 * self.mass_bob_2 * v2.norm_squared();

        let h1 = -(self.bob_1.y - self.origin.y);
        let h2 = -(self.bob_2.y - self.origin.y);
        let potential = self.mass_bob_1 * self.g * h1 + self.mass_bob_2 * self.g * h2;

        EnergyReport {
            kinetic,
            potential,
            total: kinetic + potential,
        }
    }

    /// Name of the first angle, velocity or coordinate that is NaN or infinite.
    pub(crate) fn first_non_finite(&self) -> Option<&'static str> {
        let fields = [
            ("theta_1", self.theta_1),
            ("theta_2", self.theta_2),
            ("omega_1", self.omega_1),
            ("omega_2", self.omega_2),
            ("x_1", self.bob_1.x),
            ("y_1", self.bob_1.y),
            ("x_2", self.bob_2.x),
            ("y_2", self.bob_2.y),
        ];
        fields
            .into_iter()
            .find(|(_, value)| !value.is_finite())
            .map(|(name, _)| name)
    }
}

/// Positions of the two bobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub bob_1: Point2<f64>,
    pub bob_2: Point2<f64>,
}

/// Energy breakdown, recomputed from state on every query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyReport {
    pub kinetic: f64,
    pub potential: f64,
    pub total: f64,
}
