//! Spawning and joining tasks on dally's executor.
//!
//! The [spawn] method adds a new asynchronous task to the running execution, which will poll it
//! to completion. The returned [JoinHandle] is itself a future that resolves to the task's output.
//!
//! All of these functions must be called from inside a [`Runner::block_on`](crate::Runner::block_on)
//! execution; they panic otherwise.

use crate::runtime::execution::ExecutionState;
use crate::runtime::task::TaskId;
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Spawn a new async task that the executor will run to completion.
pub fn spawn<T, F>(fut: F) -> JoinHandle<T>
where
    F: Future<Output = T> + 'static,
    T: 'static,
{
    spawn_inner(fut, None)
}

/// Spawn a new async task with a name. The name shows up in tracing output and in the message
/// of a failing execution.
pub fn spawn_named<T, F>(name: impl Into<String>, fut: F) -> JoinHandle<T>
where
    F: Future<Output = T> + 'static,
    T: 'static,
{
    spawn_inner(fut, Some(name.into()))
}

fn spawn_inner<T, F>(fut: F, name: Option<String>) -> JoinHandle<T>
where
    F: Future<Output = T> + 'static,
    T: 'static,
{
    let state = Rc::new(RefCell::new(JoinState {
        result: None,
        waiter: None,
    }));

    // We wrap a task returning a value inside a wrapper task that returns (). The wrapper stores
    // the value where the join handle can find it, and wakes whoever is waiting on the handle.
    let shared = Rc::clone(&state);
    let task_id = ExecutionState::spawn(
        Box::pin(async move {
            let result = fut.await;
            let waiter = {
                let mut shared = shared.borrow_mut();
                shared.result = Some(result);
                shared.waiter.take()
            };
            if let Some(waiter) = waiter {
                waiter.wake();
            }
        }),
        name,
    );

    JoinHandle { task_id, state }
}

struct JoinState<T> {
    result: Option<T>,
    waiter: Option<Waker>,
}

/// An owned permission to join on an async task (await its termination).
///
/// Dropping a `JoinHandle` detaches the task: it keeps running, and its output is discarded.
pub struct JoinHandle<T> {
    task_id: TaskId,
    state: Rc<RefCell<JoinState<T>>>,
}

impl<T> JoinHandle<T> {
    /// The id of the task this handle joins on
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }
}

impl<T> fmt::Debug for JoinHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinHandle")
            .field("task_id", &self.task_id)
            .field("finished", &self.state.borrow().result.is_some())
            .finish()
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.state.borrow_mut();
        match state.result.take() {
            Some(result) => Poll::Ready(result),
            None => {
                state.waiter = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// Yields execution back to the scheduler.
///
/// Borrowed from the Tokio implementation.
#[must_use = "yield_now does nothing unless polled/`await`-ed"]
pub async fn yield_now() {
    /// Yield implementation
    struct YieldNow {
        yielded: bool,
    }

    impl Future for YieldNow {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.yielded {
                return Poll::Ready(());
            }

            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }

    YieldNow { yielded: false }.await
}
