//! Pendulum Core - Double Pendulum Integrator
//!
//! Numerically integrates a double pendulum (two massless rods, two point
//! masses, uniform gravity) and exposes the live state behind a
//! thread-safe engine:
//! 1. **Dynamics**: regime selection and the semi-implicit Euler step
//! 2. **Engine**: one state behind one lock, atomic steps / writes / reset
//! 3. **Driver**: a perpetual background loop with fault isolation
//! 4. **Facade**: the request/response records a web layer serves

pub mod conservation;
pub mod driver;
pub mod dynamics;
pub mod engine;
pub mod error;
pub mod facade;
pub mod params;
pub mod presets;
pub mod state;

// Re-export key types for convenience
pub use conservation::EnergyMonitor;
pub use driver::{BackgroundDriver, DriverConfig, DriverHandle, DriverStats};
pub use dynamics::Regime;
pub use engine::{BatchOutcome, SimulationEngine, Snapshot, StepReport, DEFAULT_DT};
pub use error::{ParameterError, StepFault};
pub use facade::SimulationFacade;
pub use params::Parameter;
pub use presets::Preset;
pub use state::{Coordinates, EnergyReport, PendulumState};
