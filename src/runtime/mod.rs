//! Runtime subsystem modules.

pub(crate) mod context;
mod core;
pub(crate) mod driver;
pub(crate) mod yield_now;

pub use context::spawn;
pub use self::core::Scheduler;
pub use driver::{Backend, ControlFlow, FrameLoop};
pub use yield_now::{Co, Delegate, Suspend};
