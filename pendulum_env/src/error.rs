//! Error types for the environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// No async runtime is available to host a spawned task
    #[error("No runtime available to spawn task '{0}'")]
    NoRuntime(String),
}

impl EnvError {
    /// Creates a missing-runtime error for the named task.
    pub fn no_runtime(task: impl Into<String>) -> Self {
        Self::NoRuntime(task.into())
    }
}
