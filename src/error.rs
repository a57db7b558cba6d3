//! Error types surfaced by tasks, the scheduler and the frame loop.

use thiserror::Error;

/// Failure captured from a task body.
///
/// Stored on the task that raised it and handed to the owner once the task is
/// observed done: the delegating parent through [`Co::delegate`], or the caller
/// of [`Task::resume`] / [`Scheduler::tick`] for a root task.
///
/// [`Co::delegate`]: crate::Co::delegate
/// [`Task::resume`]: crate::Task::resume
/// [`Scheduler::tick`]: crate::Scheduler::tick
#[derive(Debug, Error)]
pub enum TaskError {
    /// The body returned an error.
    #[error("task failed: {0:#}")]
    Failed(anyhow::Error),

    /// The body panicked.
    #[error("task panicked: {0}")]
    Panicked(String),
}

impl TaskError {
    /// Builds a [`TaskError::Failed`] from a plain message.
    pub fn msg<M>(message: M) -> Self
    where
        M: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        TaskError::Failed(anyhow::Error::msg(message))
    }
}

impl From<anyhow::Error> for TaskError {
    // A child failure forwarded with `?` comes back wrapped in anyhow; unwrap it
    // rather than nesting one TaskError inside another.
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<TaskError>() {
            Ok(inner) => inner,
            Err(err) => TaskError::Failed(err),
        }
    }
}

/// Invalid frame loop configuration, reported by [`LoopBuilder::build`].
///
/// [`LoopBuilder::build`]: crate::LoopBuilder::build
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("expected finite fps >= 0, got {0}")]
    InvalidFps(f32),

    #[error("expected finite 0 < ups <= fps, got ups = {ups} with fps = {fps}")]
    InvalidUps { ups: f32, fps: f32 },

    #[error("expected at least one fixed update step per frame")]
    NoFixedSteps,
}

/// Error that stopped a running frame loop.
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("scheduled task failed")]
    Task(#[from] TaskError),
}
