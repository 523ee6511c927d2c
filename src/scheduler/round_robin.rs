use crate::scheduler::{Scheduler, TaskId};

/// A round robin scheduler that chooses the next available runnable task at each context switch.
#[derive(Debug, Default)]
pub struct RoundRobinScheduler;

impl RoundRobinScheduler {
    /// Construct a new `RoundRobinScheduler`, which polls runnable tasks in a round-robin fashion
    /// ordered by task id.
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for RoundRobinScheduler {
    fn next_task(&mut self, runnable: &[TaskId], current: Option<TaskId>) -> TaskId {
        let current = match current {
            Some(current) => current,
            None => return runnable[0],
        };

        *runnable.iter().find(|t| **t > current).unwrap_or(&runnable[0])
    }
}
