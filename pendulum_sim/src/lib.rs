//! Headless harness for the double pendulum simulator.
//!
//! Every scenario runs a fresh [`SimulationEngine`](pendulum_core::SimulationEngine)
//! under the real [`BackgroundDriver`](pendulum_core::BackgroundDriver), but
//! on a virtual clock:
//!
//! - **Time**: [`SimContext`] only moves when the harness advances it
//! - **Randomness**: perturbations and random writes derive from one 64-bit seed
//!
//! so a run is fully reproducible from its seed.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │                ScenarioRunner                  │
//! │  ┌───────────────┐      ┌───────────────────┐  │
//! │  │  SimContext   │◄─────│ BackgroundDriver  │  │
//! │  │ virtual clock │      │  tick() per loop  │  │
//! │  └───────────────┘      └─────────┬─────────┘  │
//! │                                   ▼            │
//! │  readers/writers ──────► SimulationEngine      │
//! │                          Arc<RwLock<state>>    │
//! │                                   │            │
//! │  EnergyMonitor ◄──── snapshots ───┘            │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use pendulum_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42).with_steps(500).run(ScenarioId::SingleRod);
//! assert!(result.passed);
//! ```

mod context;
mod exporter;
mod runner;
pub mod scenarios;

pub use context::SimContext;
pub use exporter::{SimExport, SimFrame};
pub use runner::{coordinates_consistent, summary_json, ScenarioResult, ScenarioRunner};
