//! Registry of root tasks driven once per tick.
//!
//! The scheduler owns every root task handed to it. Each [`Scheduler::tick`]
//! resumes every owned task exactly once, in submission order, then drops the
//! ones that finished and reports the first failure among them.

use crate::error::TaskError;
use crate::task::Task;

use log::{debug, error, trace};

use std::cell::{Cell, RefCell};

/// Collection of root tasks advanced one step per tick.
///
/// All methods take `&self` so that task bodies and frame hooks can submit new
/// work while a tick is in progress. Tasks submitted during a tick are first
/// resumed on the following tick.
///
/// # Example
/// ```ignore
/// let scheduler = Scheduler::new();
/// scheduler.submit(Task::new(|co| async move {
///     co.suspend().await;
///     Ok(())
/// }));
///
/// while !scheduler.is_empty() {
///     scheduler.tick()?;
/// }
/// ```
#[derive(Default)]
pub struct Scheduler {
    tasks: RefCell<Vec<Task>>,
    incoming: RefCell<Vec<Task>>,
    running: Cell<usize>,
    ticking: Cell<bool>,
}

impl Scheduler {
    /// Creates a scheduler with no tasks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands a root task over to the scheduler.
    pub fn submit(&self, task: Task) {
        trace!("submitted {task:?}");
        self.incoming.borrow_mut().push(task);
    }

    /// Resumes every owned task once and drops the ones that finished.
    ///
    /// A failing task does not stop the others from being resumed in the same
    /// tick. Once all of them ran, the first failure (in submission order) is
    /// returned; any further failures from the same tick are logged.
    ///
    /// # Panics
    /// Panics if called from inside a task body driven by this scheduler.
    pub fn tick(&self) -> Result<(), TaskError> {
        assert!(!self.ticking.replace(true), "Scheduler::tick() called re-entrantly");

        let mut tasks = std::mem::take(&mut *self.tasks.borrow_mut());
        tasks.append(&mut self.incoming.borrow_mut());
        self.running.set(tasks.len());

        let mut pass = Pass {
            scheduler: self,
            tasks,
        };

        let mut failures = Vec::new();
        let before = pass.tasks.len();

        pass.tasks.retain_mut(|task| {
            // Already-finished submissions are dropped without being resumed.
            if !task.done()
                && let Err(failure) = task.resume()
            {
                failures.push(failure);
            }

            if task.done() {
                self.running.set(self.running.get() - 1);
                return false;
            }
            true
        });

        let remaining = pass.tasks.len();
        if remaining != before {
            debug!("tick retired {} task(s), {remaining} remaining", before - remaining);
        }

        drop(pass);

        let mut failures = failures.into_iter();
        match failures.next() {
            Some(first) => {
                for extra in failures {
                    error!("additional task failure in the same tick: {extra}");
                }
                Err(first)
            }
            None => Ok(()),
        }
    }

    /// Ticks until no task is left, stopping at the first failure.
    pub fn run_until_idle(&self) -> Result<(), TaskError> {
        while !self.is_empty() {
            self.tick()?;
        }
        Ok(())
    }

    /// Returns true if no task is owned, including ones submitted mid-tick.
    ///
    /// Roots taking part in a tick that is in progress count as owned until
    /// they are retired.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of owned tasks, including ones submitted mid-tick.
    pub fn len(&self) -> usize {
        self.tasks.borrow().len() + self.running.get() + self.incoming.borrow().len()
    }
}

/// Roots taken out of a scheduler for one tick.
///
/// Hands them back and clears the tick flag when dropped, including while
/// unwinding from a panicking resume.
struct Pass<'a> {
    scheduler: &'a Scheduler,
    tasks: Vec<Task>,
}

impl Drop for Pass<'_> {
    fn drop(&mut self) {
        *self.scheduler.tasks.borrow_mut() = std::mem::take(&mut self.tasks);
        self.scheduler.running.set(0);
        self.scheduler.ticking.set(false);
    }
}
