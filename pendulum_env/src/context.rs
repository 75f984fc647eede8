//! Core environment context trait for the simulator.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::error::EnvError;

/// The central interface for environment interaction.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time` and `tokio::spawn`
/// - **Harness**: `SimContext` (in `pendulum_sim`) - virtual clock that
///   advances on `sleep`
#[async_trait]
pub trait SimulationContext: Send + Sync + 'static {
    /// Returns the monotonic time elapsed since the context was created.
    ///
    /// In the harness this is the virtual clock.
    fn now(&self) -> Duration;

    /// Suspends the caller for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In the harness: advances the virtual clock and returns immediately
    async fn sleep(&self, duration: Duration);

    /// Spawns a named background task.
    ///
    /// Fails with [`EnvError::NoRuntime`] when there is nothing to run the
    /// task on.
    fn spawn<F>(&self, name: &str, future: F) -> Result<(), EnvError>
    where
        F: Future<Output = ()> + Send + 'static;
}
