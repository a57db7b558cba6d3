//! Hierarchical cooperative tasks for tick-driven loops.
//!
//! This crate lets suspendable routines compose into trees: a task can hand
//! execution to a child task and is resumed transparently once the child
//! finishes, with failures flowing back up the chain. Root tasks are owned by
//! a scheduler that advances each of them one step per tick.
//!
//! # Architecture
//!
//! - **Task**: Move-only suspendable unit wrapping an `async` body
//! - **Co**: Handle a body uses to suspend or delegate to another task
//! - **Scheduler**: Registry of root tasks, resumed once per tick
//! - **FrameLoop**: Fixed-timestep driver that ticks a scheduler every frame
//! - **LoopBuilder**: Fluent builder for frame loop configuration
//!
//! Everything runs on a single thread; tasks only stop at their own
//! suspension points.

mod builder;
mod error;
mod runtime;
mod task;
mod utils;

pub use builder::LoopBuilder;
pub use error::{ConfigError, LoopError, TaskError};
pub use runtime::{Backend, Co, ControlFlow, Delegate, FrameLoop, Scheduler, Suspend, spawn};
pub use task::Task;
