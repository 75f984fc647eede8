//! Pendulum Environment Abstraction Layer
//!
//! This crate keeps the simulator's notion of time out of the physics code
//! so the same background driver can run in **Production** (tokio, real
//! wall clock) and in the **Harness** (virtual clock, instant sleeps).
//!
//! Everything that would otherwise touch the outside world goes through
//! [`SimulationContext`]:
//! - Time (`now()`, `sleep()`)
//! - Task spawning (`spawn()`)
//!
//! # Example
//!
//! ```ignore
//! use pendulum_env::{SimulationContext, TokioContext};
//!
//! async fn driver_loop<Ctx: SimulationContext>(ctx: &Ctx) {
//!     loop {
//!         step();
//!         ctx.sleep(Duration::from_millis(30)).await;
//!     }
//! }
//! ```

mod context;
mod error;
mod tokio_impl;

pub use context::SimulationContext;
pub use error::EnvError;
pub use tokio_impl::TokioContext;
