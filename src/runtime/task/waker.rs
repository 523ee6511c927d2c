use crate::runtime::execution::ExecutionState;
use crate::runtime::task::TaskId;
use futures::task::ArcWake;
use std::sync::Arc;

/// A `Waker` (created via `ArcWake`) that just tells the `ExecutionState` to wake the given task.
/// Waking after the execution has ended is a no-op.
#[derive(Debug)]
pub(crate) struct TaskWaker {
    task_id: TaskId,
}

impl TaskWaker {
    pub(crate) fn new(task_id: TaskId) -> Self {
        Self { task_id }
    }
}

impl ArcWake for TaskWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        ExecutionState::try_with(|state| state.wake(arc_self.task_id));
    }
}
