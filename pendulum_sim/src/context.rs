//! Simulation context implementing SimulationContext on a virtual clock.

use async_trait::async_trait;
use pendulum_env::{EnvError, SimulationContext};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// Virtual-clock context for headless runs.
///
/// Time only moves when the harness advances it (or when something sleeps),
/// so a scenario covering minutes of wall clock finishes instantly and
/// reports the same times on every run.
pub struct SimContext {
    /// Master seed for this run
    seed: u64,

    /// Current virtual time (nanoseconds since start)
    virtual_time_ns: Arc<AtomicU64>,
}

impl SimContext {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            virtual_time_ns: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Creates an Arc-wrapped context for sharing.
    pub fn shared(seed: u64) -> Arc<Self> {
        Arc::new(Self::new(seed))
    }

    /// Advances virtual time by the given duration.
    pub fn advance_time(&self, duration: Duration) {
        self.virtual_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }

    pub fn time_ns(&self) -> u64 {
        self.virtual_time_ns.load(Ordering::SeqCst)
    }

    /// Seed every random stream of the run is derived from.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Clone for SimContext {
    fn clone(&self) -> Self {
        Self {
            seed: self.seed,
            virtual_time_ns: Arc::clone(&self.virtual_time_ns),
        }
    }
}

#[async_trait]
impl SimulationContext for SimContext {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.time_ns())
    }

    async fn sleep(&self, duration: Duration) {
        // Sleeping is just moving the clock forward
        self.advance_time(duration);
    }

    fn spawn<F>(&self, name: &str, future: F) -> Result<(), EnvError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = Handle::try_current().map_err(|_| EnvError::no_runtime(name))?;
        handle.spawn(future);
        Ok(())
    }
}
