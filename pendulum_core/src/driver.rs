//! Background Driver - steps the engine forever at a fixed cadence.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              BackgroundDriver                │
//! │                                              │
//! │   loop {                                     │
//! │       tick()  ── engine.step(step_dt) ──┐    │
//! │                                         │    │
//! │       ctx.sleep(tick_interval)          ▼    │
//! │   }                          Ok  → counters  │
//! │                              Err → warn!     │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The physics step (`0.06`) and the wall-clock interval (`30 ms`) are
//! independent: simulated time runs twice as fast as the sleep cadence
//! alone would suggest.
//!
//! # Usage
//!
//! ```ignore
//! use pendulum_core::{BackgroundDriver, DriverConfig, SimulationEngine};
//! use pendulum_env::TokioContext;
//!
//! let engine = SimulationEngine::new();
//! let driver = BackgroundDriver::new(TokioContext::shared(), engine.clone(), DriverConfig::default());
//! let handle = driver.spawn()?;
//! ```

use crate::conservation::EnergyMonitor;
use crate::engine::{SimulationEngine, StepReport, DEFAULT_DT};
use crate::error::StepFault;
use pendulum_env::{EnvError, SimulationContext};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the background driver.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Physics time step per tick (default: 0.06)
    pub step_dt: f64,

    /// Sleep between ticks (default: 30 ms)
    pub tick_interval: Duration,

    /// Log an energy report every N ticks; 0 disables (default: 100)
    pub report_every: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            step_dt: DEFAULT_DT,
            tick_interval: Duration::from_millis(30),
            report_every: 100,
        }
    }
}

impl DriverConfig {
    pub fn with_step_dt(mut self, dt: f64) -> Self {
        self.step_dt = dt;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_report_every(mut self, ticks: u64) -> Self {
        self.report_every = ticks;
        self
    }
}

#[derive(Debug, Default)]
struct Counters {
    ticks: AtomicU64,
    faults: AtomicU64,
}

/// Tick and fault counts at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DriverStats {
    pub ticks: u64,
    pub faults: u64,
}

impl DriverStats {
    pub fn successful_steps(&self) -> u64 {
        self.ticks.saturating_sub(self.faults)
    }
}

/// Read-only view of a running driver's counters.
///
/// There is deliberately no stop or pause here.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    counters: Arc<Counters>,
}

impl DriverHandle {
    pub fn stats(&self) -> DriverStats {
        load_stats(&self.counters)
    }
}

// A fault is counted after its tick, so faults are read first.
fn load_stats(counters: &Counters) -> DriverStats {
    let faults = counters.faults.load(Ordering::Acquire);
    DriverStats {
        ticks: counters.ticks.load(Ordering::Acquire),
        faults,
    }
}

/// Steps a [`SimulationEngine`] on a fixed cadence.
///
/// Generic over the context so the same loop runs on tokio in production
/// and on a virtual clock in the harness.
pub struct BackgroundDriver<Ctx>
where
    Ctx: SimulationContext,
{
    context: Arc<Ctx>,
    engine: SimulationEngine,
    config: DriverConfig,
    counters: Arc<Counters>,
    monitor: EnergyMonitor,
}

impl<Ctx> BackgroundDriver<Ctx>
where
    Ctx: SimulationContext,
{
    pub fn new(context: Arc<Ctx>, engine: SimulationEngine, config: DriverConfig) -> Self {
        let monitor = EnergyMonitor::new(&engine.full_state());
        Self {
            context,
            engine,
            config,
            counters: Arc::new(Counters::default()),
            monitor,
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn stats(&self) -> DriverStats {
        load_stats(&self.counters)
    }

    pub fn handle(&self) -> DriverHandle {
        DriverHandle {
            counters: Arc::clone(&self.counters),
        }
    }

    /// Runs one step with fault isolation.
    ///
    /// A fault is counted and logged; the engine keeps its last good state.
    pub fn tick(&mut self) -> Result<StepReport, StepFault> {
        let outcome = self.engine.step(self.config.step_dt);
        let ticks = self.counters.ticks.fetch_add(1, Ordering::Release) + 1;

        match &outcome {
            Ok(report) => {
                if self.config.report_every > 0 && ticks % self.config.report_every == 0 {
                    let snapshot = self.engine.full_state();
                    let drift = self.monitor.observe(&snapshot);
                    debug!(
                        tick = ticks,
                        step = report.step,
                        regime = %report.regime,
                        total_energy = snapshot.energy.total,
                        drift,
                        "driver report"
                    );
                }
            }
            Err(fault) => {
                let faults = self.counters.faults.fetch_add(1, Ordering::Release) + 1;
                warn!(tick = ticks, faults, "Error occurred in simulation: {}", fault);
            }
        }

        outcome
    }

    /// Steps for `ticks` iterations, sleeping between them.
    pub async fn run_ticks(&mut self, ticks: u64) {
        for _ in 0..ticks {
            // Faults are logged inside tick()
            let _ = self.tick();
            self.context.sleep(self.config.tick_interval).await;
        }
    }

    /// Steps forever.
    pub async fn run(mut self) {
        info!(
            step_dt = self.config.step_dt,
            interval_ms = self.config.tick_interval.as_millis() as u64,
            "background driver started"
        );
        loop {
            let _ = self.tick();
            self.context.sleep(self.config.tick_interval).await;
        }
    }

    /// Hands [`run`](Self::run) to the context and returns a counters handle.
    pub fn spawn(self) -> Result<DriverHandle, EnvError> {
        let handle = self.handle();
        let context = Arc::clone(&self.context);
        context.spawn("pendulum-driver", self.run())?;
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Parameter;
    use pendulum_env::TokioContext;

    fn fast_config() -> DriverConfig {
        DriverConfig::default()
            .with_tick_interval(Duration::from_millis(1))
            .with_report_every(5)
    }

    #[test]
    fn test_driver_config_default() {
        let config = DriverConfig::default();
        assert_eq!(config.step_dt, 0.06);
        assert_eq!(config.tick_interval, Duration::from_millis(30));
        assert_eq!(config.report_every, 100);
    }

    #[test]
    fn test_tick_steps_engine() {
        let engine = SimulationEngine::new();
        let mut driver = BackgroundDriver::new(TokioContext::shared(), engine.clone(), fast_config());

        let report = driver.tick().unwrap();

        assert_eq!(report.step, 1);
        assert_eq!(engine.full_state().steps, 1);
        assert_eq!(driver.stats(), DriverStats { ticks: 1, faults: 0 });
    }

    #[test]
    fn test_tick_isolates_faults() {
        let engine = SimulationEngine::new();
        engine.set(Parameter::LengthRod1, 0.0).unwrap();
        let mut driver = BackgroundDriver::new(TokioContext::shared(), engine.clone(), fast_config());
        let before = engine.full_state();

        for _ in 0..10 {
            assert!(driver.tick().is_err());
        }

        assert_eq!(driver.stats(), DriverStats { ticks: 10, faults: 10 });
        assert_eq!(driver.stats().successful_steps(), 0);
        assert_eq!(engine.full_state(), before);

        // Fixing the parameter lets the very next tick succeed
        engine.set(Parameter::LengthRod1, 120.0).unwrap();
        assert!(driver.tick().is_ok());
        assert_eq!(driver.stats().faults, 10);
    }

    #[test]
    fn test_successful_steps_never_underflows() {
        let stats = DriverStats {
            ticks: 3,
            faults: 5,
        };
        assert_eq!(stats.successful_steps(), 0);
    }

    #[test]
    fn test_handle_reads_faults_within_ticks() {
        let engine = SimulationEngine::new();
        engine.set(Parameter::LengthRod1, 0.0).unwrap();
        let mut driver = BackgroundDriver::new(TokioContext::shared(), engine, fast_config());
        let handle = driver.handle();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..2_000 {
                    let stats = handle.stats();
                    assert!(stats.faults <= stats.ticks, "{:?}", stats);
                }
            });
            for _ in 0..2_000 {
                let _ = driver.tick();
            }
        });

        assert_eq!(handle.stats().successful_steps(), 0);
        assert_eq!(handle.stats().faults, 2_000);
    }

    #[tokio::test]
    async fn test_run_ticks() {
        let engine = SimulationEngine::new();
        let mut driver = BackgroundDriver::new(TokioContext::shared(), engine.clone(), fast_config());

        driver.run_ticks(12).await;

        assert_eq!(driver.stats().ticks, 12);
        assert_eq!(engine.full_state().steps, 12);
    }

    #[tokio::test]
    async fn test_spawned_driver_keeps_running() {
        let engine = SimulationEngine::new();
        let driver = BackgroundDriver::new(TokioContext::shared(), engine.clone(), fast_config());
        let handle = driver.spawn().unwrap();

        let start = engine.full_state();
        for _ in 0..200 {
            if handle.stats().ticks >= 5 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(handle.stats().ticks >= 5);
        assert_ne!(engine.full_state().state.theta_1, start.state.theta_1);

        // External writes land while the driver runs
        engine.set_parameter("g", 0.0).unwrap();
        assert_eq!(engine.parameter(Parameter::Gravity), 0.0);
    }

    #[test]
    fn test_spawn_without_runtime_fails() {
        let driver = BackgroundDriver::new(
            TokioContext::shared(),
            SimulationEngine::new(),
            DriverConfig::default(),
        );
        assert!(matches!(driver.spawn(), Err(EnvError::NoRuntime(_))));
    }
}
