//! Implementations of different scheduling strategies for the executor.
//!
//! Whenever more than one task is runnable, the executor asks its [`Scheduler`] which one to poll
//! next. Because dally's tasks cooperate (they only give up control at `.await` points), the choice
//! never affects correctness, but it does decide the interleaving of task side effects.

mod random;
mod round_robin;

pub use crate::runtime::task::TaskId;
pub use random::RandomScheduler;
pub use round_robin::RoundRobinScheduler;

use std::fmt::Debug;

/// A `Scheduler` is an oracle that decides the order in which to poll concurrent tasks.
///
/// The `Scheduler` lives across multiple executions run by the same [`Runner`](crate::Runner),
/// allowing it to retain state between them. It is consulted from inside the running execution,
/// so an implementation may draw from [`thread_rng`](crate::rand::thread_rng) or read
/// [`time::now`](crate::time::now).
pub trait Scheduler: Debug {
    /// Decide which task to poll next, given a list of runnable tasks and the most recently polled
    /// task. If `current_task` is `None`, the execution has not yet begun. The list of runnable
    /// tasks is guaranteed to be non-empty, and the returned task must be one of them.
    fn next_task(&mut self, runnable_tasks: &[TaskId], current_task: Option<TaskId>) -> TaskId;
}

