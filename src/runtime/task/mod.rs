use crate::runtime::task::waker::TaskWaker;
use futures::future::LocalBoxFuture;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::task::Waker;

pub(crate) mod waker;

// A note on terminology: a "task" is this runtime's reflection of a user-level future handed to
// `Runner::block_on` or `asynch::spawn`. Each task has a state (runnable, blocked, finished).
// The scheduler takes the list of runnable tasks and picks the one to poll next; a task becomes
// blocked when its poll returns Pending without having woken itself, and runnable again when its
// waker fires.

// Task lists up to this size are kept on the stack
pub(crate) const MAX_INLINE_TASKS: usize = 16;

/// A unique identifier for a task within a single execution
#[derive(PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord, Debug)]
pub struct TaskId(pub(crate) usize);

impl From<usize> for TaskId {
    fn from(id: usize) -> Self {
        TaskId(id)
    }
}

impl From<TaskId> for usize {
    fn from(tid: TaskId) -> usize {
        tid.0
    }
}

/// A `Task` is a future being driven by the executor, together with its scheduling state.
pub(crate) struct Task {
    pub(crate) id: TaskId,
    pub(crate) state: TaskState,
    pub(crate) future: Rc<RefCell<LocalBoxFuture<'static, ()>>>,
    name: Option<String>,
    waker: Waker,
    // Set when the task's waker fires while the task is runnable (typically while it is being
    // polled). A task that wakes itself must not be blocked when its poll returns Pending.
    woken: bool,
}

impl Task {
    pub(crate) fn new(future: LocalBoxFuture<'static, ()>, id: TaskId, name: Option<String>) -> Self {
        let waker = futures::task::waker(Arc::new(TaskWaker::new(id)));
        Self {
            id,
            state: TaskState::Runnable,
            future: Rc::new(RefCell::new(future)),
            name,
            waker,
            woken: false,
        }
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| format!("task-{}", self.id.0))
    }

    pub(crate) fn waker(&self) -> Waker {
        self.waker.clone()
    }

    pub(crate) fn runnable(&self) -> bool {
        self.state == TaskState::Runnable
    }

    pub(crate) fn blocked(&self) -> bool {
        self.state == TaskState::Blocked
    }

    pub(crate) fn finished(&self) -> bool {
        self.state == TaskState::Finished
    }

    /// Called right before the task is polled
    pub(crate) fn begin_poll(&mut self) {
        assert_eq!(self.state, TaskState::Runnable);
        self.woken = false;
    }

    /// Handle a wakeup: a blocked task becomes runnable again, a runnable one remembers that it
    /// was woken, and a finished one ignores it (stale wakers may outlive their task).
    pub(crate) fn wake(&mut self) {
        match self.state {
            TaskState::Blocked => self.state = TaskState::Runnable,
            TaskState::Runnable => self.woken = true,
            TaskState::Finished => {}
        }
    }

    /// The task's poll returned Pending. Block it unless it was woken in the meantime.
    pub(crate) fn block_after_running(&mut self) {
        assert_eq!(self.state, TaskState::Runnable);
        if !std::mem::replace(&mut self.woken, false) {
            self.state = TaskState::Blocked;
        }
    }

    pub(crate) fn finish(&mut self) {
        self.state = TaskState::Finished;
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub(crate) enum TaskState {
    Runnable,
    Blocked,
    Finished,
}
