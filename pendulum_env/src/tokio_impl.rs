//! Production implementation of SimulationContext using Tokio.

use crate::{EnvError, SimulationContext};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;

/// Production context backed by Tokio and the system clock.
pub struct TokioContext {
    /// Start time for monotonic duration calculations
    start: Instant,
}

impl TokioContext {
    /// Creates a new TokioContext.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Creates an Arc-wrapped context for sharing across tasks.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for TokioContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SimulationContext for TokioContext {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_tokio_context_time() {
        let ctx = TokioContext::new();
        let t1 = ctx.now();
        ctx.sleep(Duration::from_millis(10)).await;
        let t2 = ctx.now();

        assert!(t2 > t1);
        assert!(t2 - t1 >= Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_tokio_context_spawn_runs_task() {
        let ctx = TokioContext::new();
        let flag = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&flag);

        ctx.spawn("flag-setter", async move {
            seen.store(true, Ordering::SeqCst);
        })
        .unwrap();

        for _ in 0..50 {
            if flag.load(Ordering::SeqCst) {
                break;
            }
            ctx.sleep(Duration::from_millis(5)).await;
        }
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_tokio_context_spawn_without_runtime() {
        let ctx = TokioContext::new();
        let result = ctx.spawn("orphan", async {});

        assert!(matches!(result, Err(EnvError::NoRuntime(name)) if name == "orphan"));
    }
}
