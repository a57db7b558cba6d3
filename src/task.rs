//! Suspendable tasks that compose into delegation chains.
//!
//! A task wraps an `async` body that can stop at two kinds of suspension
//! points, both reached through the [`Co`] handle it receives:
//!
//! - [`Co::suspend`] yields control back to whoever resumed the task.
//! - [`Co::delegate`] hands control to another task until that task finishes.
//!
//! # Example
//!
//! ```ignore
//! use cotask::Task;
//!
//! fn count(n: u32) -> Task {
//!     Task::new(move |co| async move {
//!         for _ in 0..n {
//!             co.suspend().await;
//!         }
//!         Ok(())
//!     })
//! }
//!
//! let mut task = Task::new(|co| async move {
//!     co.delegate(count(3)).await?;
//!     co.delegate(count(5)).await?;
//!     Ok(())
//! });
//!
//! while !task.done() {
//!     task.resume()?;
//! }
//! ```
//!
//! # How Delegation Works
//!
//! Every frame of a tree lives in an arena owned by the root task and is
//! addressed by a `FrameId`. A frame records the root of its tree and the
//! frame that delegated to it; a frame whose parent is itself has not been
//! delegated to. The tree also remembers its active leaf, the only frame that
//! runs when the tree is resumed.
//!
//! 1. A body awaits [`Co::delegate`], which parks the child task and suspends
//! 2. The child's frames are moved into the parent's arena and the child's leaf
//!    becomes the active frame, all in the same resume
//! 3. Each resume polls the active frame once
//! 4. When the active frame finishes it is released, its result is handed to
//!    the frame that delegated to it, and that frame is polled straight away
//! 5. Unwinding stops at the first frame that suspends, or at the root

use crate::error::TaskError;
use crate::runtime::yield_now::{Co, Link, Request};
use crate::utils::slab::{FrameId, Slab};

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use futures::task::noop_waker_ref;
use log::{debug, trace};

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;
use std::task::{Context, Poll};

type Body = LocalBoxFuture<'static, std::thread::Result<anyhow::Result<()>>>;

/// A suspendable unit of cooperative execution.
///
/// Tasks are move-only: whoever holds the value is the only one able to resume
/// or drop it. Dropping an unfinished task tears down its body and every task
/// it is currently delegating to; nothing inside the bodies is notified.
///
/// A root task is usually handed to a [`Scheduler`], which resumes it once per
/// tick. Tasks can also be driven by hand with [`Task::resume`].
///
/// [`Scheduler`]: crate::Scheduler
#[derive(Default)]
pub struct Task {
    tree: Option<Tree>,
}

impl Task {
    /// Creates a task from a body.
    ///
    /// The closure is called immediately to build the body future, but the
    /// future itself does not run until the first [`Task::resume`].
    ///
    /// A body returning `Err`, or panicking, fails the task. The failure is
    /// kept on the task and reported to its owner once the task is done.
    ///
    /// # Example
    /// ```ignore
    /// let task = Task::new(|co| async move {
    ///     co.suspend().await;
    ///     Ok(())
    /// });
    /// ```
    pub fn new<F, Fut>(body: F) -> Self
    where
        F: FnOnce(Co) -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        let link = Rc::new(Link::default());
        let body = AssertUnwindSafe(body(Co::new(link.clone())))
            .catch_unwind()
            .boxed_local();

        let mut frames = Slab::new(1);
        let root = frames.insert_with(|id| Frame {
            body,
            link,
            root: id,
            parent: id,
            completed: false,
            failure: None,
        });

        Self {
            tree: Some(Tree {
                frames,
                root,
                active: root,
            }),
        }
    }

    /// Creates a task with an empty body.
    ///
    /// It is done from the start and never needs resuming. Delegating to it
    /// does not suspend the delegating body.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true once the task, and everything it delegated to, has finished.
    pub fn done(&self) -> bool {
        self.tree.is_none()
    }

    /// Number of frames in the task's delegation chain, itself included.
    ///
    /// Zero once the task is done.
    pub fn depth(&self) -> usize {
        self.tree.as_ref().map_or(0, |tree| tree.frames.len())
    }

    /// Runs the task until its active frame suspends or the whole task finishes.
    ///
    /// Only the active leaf of the delegation chain is polled. If it finishes,
    /// the frames above it are resumed in turn within this same call, so a
    /// finished chain collapses in a single resume.
    ///
    /// When the task finishes, its body is released and any failure it
    /// captured is returned. A task still running always yields `Ok(())`.
    ///
    /// # Panics
    /// Panics if the task is already done, or if its body awaits anything other
    /// than the suspension points provided by [`Co`].
    pub fn resume(&mut self) -> Result<(), TaskError> {
        let Some(tree) = self.tree.as_mut() else {
            panic!("resumed a task that is already done");
        };

        tree.run();

        if !tree.finished() {
            return Ok(());
        }

        match self.tree.take() {
            Some(mut tree) => tree.take_failure().map_or(Ok(()), Err),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Task");
        debug.field("done", &self.done());

        if let Some(tree) = &self.tree {
            debug
                .field("root", &tree.root)
                .field("active", &tree.active)
                .field("depth", &tree.frames.len());
        }

        debug.finish()
    }
}

/// One body in a delegation chain.
struct Frame {
    body: Body,
    link: Rc<Link>,
    root: FrameId,
    parent: FrameId,
    completed: bool,
    failure: Option<TaskError>,
}

/// Arena holding a root frame and the chain it currently delegates to.
struct Tree {
    frames: Slab<Frame>,
    root: FrameId,
    active: FrameId,
}

/// Outcome of polling a single frame once.
enum Step {
    Suspended,
    Delegated,
    Completed,
}

impl Tree {
    fn finished(&self) -> bool {
        self.frames.get(self.root).completed
    }

    fn take_failure(&mut self) -> Option<TaskError> {
        self.frames.get_mut(self.root).failure.take()
    }

    fn run(&mut self) {
        loop {
            let id = self.active;

            match self.step(id) {
                Step::Suspended => return,
                Step::Delegated => {}
                Step::Completed if id == self.root => return,
                Step::Completed => self.unwind(id),
            }
        }
    }

    fn step(&mut self, id: FrameId) -> Step {
        let frame = self.frames.get_mut(id);
        assert!(!frame.completed, "resumed finished task frame {id:?}");

        let mut cx = Context::from_waker(noop_waker_ref());
        let polled = frame.body.as_mut().poll(&mut cx);

        if frame.link.take_conflict() {
            panic!("task frame {id:?} issued two suspension requests in a single step");
        }

        let request = frame.link.take_request();

        match polled {
            Poll::Ready(result) => {
                frame.completed = true;
                frame.failure = match result {
                    Ok(Ok(())) => None,
                    Ok(Err(err)) => Some(TaskError::from(err)),
                    Err(payload) => Some(TaskError::Panicked(panic_message(&*payload))),
                };

                match &frame.failure {
                    Some(failure) => debug!("task frame {id:?} failed: {failure}"),
                    None => trace!("task frame {id:?} completed"),
                }

                Step::Completed
            }
            Poll::Pending => match request {
                Some(Request::Suspend) => {
                    trace!("task frame {id:?} suspended");
                    Step::Suspended
                }
                Some(Request::Delegate(child)) => {
                    self.splice(id, child);
                    Step::Delegated
                }
                None => panic!(
                    "task frame {id:?} awaited something other than a suspension point"
                ),
            },
        }
    }

    // Moves the child's frames under `parent` and makes the child's leaf active.
    fn splice(&mut self, parent: FrameId, mut child: Task) {
        let Some(mut sub) = child.tree.take() else {
            trace!("task frame {parent:?} delegated to a finished task");
            self.frames.get(parent).link.deliver(Ok(()));
            return;
        };

        // A tree is a single chain from its root down to its active leaf.
        let mut chain = vec![sub.active];
        while let Some(&last) = chain.last() {
            let above = sub.frames.get(last).parent;
            if above == last {
                break;
            }
            chain.push(above);
        }

        let mut above = parent;
        for old in chain.into_iter().rev() {
            let mut frame = sub.frames.remove(old);
            frame.root = self.root;
            frame.parent = above;
            above = self.frames.insert(frame);
        }

        debug_assert_eq!(self.frames.get(above).root, self.root);
        debug!(
            "task frame {parent:?} delegated to {above:?}, chain depth {}",
            self.frames.len()
        );

        self.active = above;
    }

    // Releases a finished frame and hands its result to the frame above it.
    fn unwind(&mut self, id: FrameId) {
        let frame = self.frames.remove(id);
        let parent = frame.parent;

        trace!("task frame {id:?} returned control to {parent:?}");

        self.frames
            .get(parent)
            .link
            .deliver(frame.failure.map_or(Ok(()), Err));
        self.active = parent;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
