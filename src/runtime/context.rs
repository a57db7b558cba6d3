//! Thread-local default scheduler.
//!
//! Tasks are `!Send`, so the shared scheduler is per thread: it is created the
//! first time [`Scheduler::main`] is called on a thread and lives as long as the
//! thread does. Code that wants explicit ownership should construct its own
//! [`Scheduler`] and pass it to a [`LoopBuilder`] instead.
//!
//! [`LoopBuilder`]: crate::LoopBuilder

use crate::runtime::Scheduler;
use crate::task::Task;

use std::rc::Rc;

thread_local! {
    /// Lazily initialised on first access from each thread.
    static MAIN: Rc<Scheduler> = {
        log::debug!("initialising main scheduler for {:?}", std::thread::current().id());
        Rc::new(Scheduler::new())
    };
}

impl Scheduler {
    /// Returns the calling thread's default scheduler, creating it on first use.
    pub fn main() -> Rc<Scheduler> {
        MAIN.with(Rc::clone)
    }
}

/// Submits a root task to the calling thread's default scheduler.
///
/// Shorthand for `Scheduler::main().submit(task)`.
///
/// # Example
/// ```ignore
/// cotask::spawn(Task::new(|co| async move {
///     co.suspend().await;
///     Ok(())
/// }));
/// ```
pub fn spawn(task: Task) {
    MAIN.with(|main| main.submit(task));
}
