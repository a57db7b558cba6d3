//! Suspension points available to a task body.
//!
//! A body never sees the frame it runs in. It talks to the driver through a
//! [`Co`] handle: each suspension point parks a [`Request`] in the shared
//! [`Link`] and returns `Pending`, and the driver picks the request up right
//! after the poll returns.

use crate::error::TaskError;
use crate::task::Task;

use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// What a body asked for when it returned `Pending`.
pub(crate) enum Request {
    Suspend,
    Delegate(Task),
}

/// Mailbox shared between one frame and its body.
#[derive(Default)]
pub(crate) struct Link {
    request: Cell<Option<Request>>,
    outcome: Cell<Option<Result<(), TaskError>>>,
    conflict: Cell<bool>,
}

impl Link {
    pub(crate) fn take_request(&self) -> Option<Request> {
        self.request.take()
    }

    /// Hands a finished child's result to the body awaiting it.
    pub(crate) fn deliver(&self, outcome: Result<(), TaskError>) {
        self.outcome.set(Some(outcome));
    }

    /// True if the body posted more than one request during the last step.
    pub(crate) fn take_conflict(&self) -> bool {
        self.conflict.replace(false)
    }

    // The first request of a step wins; the driver rejects the step afterwards.
    fn post(&self, request: Request) {
        match self.request.take() {
            Some(first) => {
                self.request.set(Some(first));
                self.conflict.set(true);
            }
            None => self.request.set(Some(request)),
        }
    }
}

/// Handle given to a task body for suspending or delegating.
///
/// Obtained as the closure argument of [`Task::new`]. It is only meaningful
/// inside the body it was handed to.
///
/// # Example
/// ```ignore
/// let task = Task::new(|co| async move {
///     co.suspend().await;
///     co.delegate(Task::new(|co| async move {
///         co.suspend().await;
///         Ok(())
///     }))
///     .await?;
///     Ok(())
/// });
/// ```
#[derive(Clone)]
pub struct Co {
    link: Rc<Link>,
}

impl Co {
    pub(crate) fn new(link: Rc<Link>) -> Self {
        Self { link }
    }

    /// Suspends the body until the next resume of its task.
    pub fn suspend(&self) -> Suspend<'_> {
        Suspend {
            link: &self.link,
            posted: false,
        }
    }

    /// Hands execution to `task` until it finishes.
    ///
    /// The child runs straight away, in the same resume that reached this
    /// point. While it is unfinished every resume of the enclosing tree drives
    /// the child instead of this body. The returned future resolves with the
    /// child's captured failure, if any, once the child is done. Delegating to
    /// a task that is already done resolves immediately with `Ok(())`.
    pub fn delegate(&self, task: Task) -> Delegate<'_> {
        Delegate {
            link: &self.link,
            task: Some(task),
        }
    }
}

/// Future returned by [`Co::suspend`].
#[must_use = "suspension points do nothing unless awaited"]
pub struct Suspend<'a> {
    link: &'a Link,
    posted: bool,
}

impl Future for Suspend<'_> {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        if !self.posted {
            self.posted = true;
            self.link.post(Request::Suspend);
            return Poll::Pending;
        }
        Poll::Ready(())
    }
}

/// Future returned by [`Co::delegate`].
#[must_use = "delegation does nothing unless awaited"]
pub struct Delegate<'a> {
    link: &'a Link,
    task: Option<Task>,
}

impl Future for Delegate<'_> {
    type Output = Result<(), TaskError>;

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(task) = self.task.take() {
            self.link.post(Request::Delegate(task));
            return Poll::Pending;
        }

        match self.link.outcome.take() {
            Some(outcome) => Poll::Ready(outcome),
            None => panic!("delegation polled again before the child finished"),
        }
    }
}
