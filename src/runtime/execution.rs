use crate::runtime::failure::describe_failure;
use crate::runtime::task::{Task, TaskId, MAX_INLINE_TASKS};
use crate::runtime::timer::{Clock, TimerQueue};
use crate::scheduler::Scheduler;
use crate::Config;
use futures::future::LocalBoxFuture;
use rand::rngs::OsRng;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use scoped_tls::scoped_thread_local;
use smallvec::SmallVec;
use std::any::Any;
use std::cell::RefCell;
use std::future::Future;
use std::panic;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Instant;
use tracing::{debug, span, trace, Level};

// We use this scoped TLS to smuggle the ExecutionState, which is not 'static, into the tasks that
// need access to it (to spawn new tasks, register timers, draw random numbers, etc).
scoped_thread_local! {
    static EXECUTION_STATE: RefCell<ExecutionState>
}

/// An `Execution` encapsulates a single run of a future against a chosen scheduler. Its only
/// useful method is `Execution::run`, which drives the future (and everything it spawns) to
/// completion.
///
/// The `Execution` makes its `ExecutionState` available through the `EXECUTION_STATE` static
/// variable, but clients get access to it by calling `ExecutionState::with`.
pub(crate) struct Execution {
    scheduler: Rc<RefCell<dyn Scheduler>>,
    config: Config,
}

/// What the executor should do next
#[derive(Debug, PartialEq, Eq, Clone)]
enum Decision {
    // ask the scheduler to pick one of these tasks, given the task polled last
    Choose(SmallVec<[TaskId; MAX_INLINE_TASKS]>, Option<TaskId>),
    // nothing is runnable, but a timer is pending
    Wait(Instant),
    // every task has finished
    Finished,
    // some tasks are blocked and nothing can ever wake them
    Deadlock,
}

impl Execution {
    pub(crate) fn new(scheduler: Rc<RefCell<dyn Scheduler>>, config: Config) -> Self {
        Self { scheduler, config }
    }

    /// Run `future` as the main task, taking control of scheduling it and any tasks it might
    /// spawn. Returns once every task has finished.
    pub(crate) fn run<F>(self, future: F) -> F::Output
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let seed = self.config.seed.unwrap_or_else(|| OsRng.next_u64());
        let state = RefCell::new(ExecutionState::new(self.config, seed));
        let output = Rc::new(RefCell::new(None));

        EXECUTION_STATE.set(&state, || {
            let slot = Rc::clone(&output);
            ExecutionState::spawn(
                Box::pin(async move {
                    let result = future.await;
                    *slot.borrow_mut() = Some(result);
                }),
                Some("main".to_string()),
            );

            while self.step() {}

            ExecutionState::cleanup();
        });

        let result = output.borrow_mut().take();
        result.expect("main task finished without producing a result")
    }

    /// Execute a single step of the executor. Returns true if the execution should continue.
    fn step(&self) -> bool {
        // Fire timers that are already due, so a sleeper becomes runnable even while other tasks
        // never stop being runnable. Wake outside of `with`: the wakers call back into the state.
        let wakers = ExecutionState::with(|state| {
            let now = state.clock.now();
            state.timers.expire(now)
        });
        for waker in wakers {
            waker.wake();
        }

        let decision = ExecutionState::with(|state| state.decide());

        let task_id = match decision {
            Decision::Choose(runnable, current) => {
                // The scheduler runs outside of `with`, so it is free to use `thread_rng` or `now`
                let next = self.scheduler.borrow_mut().next_task(&runnable, current);
                assert!(runnable.contains(&next), "scheduler chose a task that is not runnable");
                debug!(?runnable, next_task = ?next);
                next
            }
            Decision::Wait(deadline) => {
                // The timers that come due are fired at the start of the next step
                ExecutionState::with(|state| {
                    debug!(pending_timers = state.timers.len(), "all tasks asleep, waiting for next timer");
                    state.clock.advance_to(deadline);
                });
                return true;
            }
            Decision::Finished => return false,
            Decision::Deadlock => {
                let message = ExecutionState::with(|state| {
                    let blocked = state
                        .tasks
                        .iter()
                        .filter(|t| t.blocked())
                        .map(|t| t.name())
                        .collect::<SmallVec<[_; MAX_INLINE_TASKS]>>();
                    describe_failure(format!("deadlock! blocked tasks: {:?}", blocked), state.seed)
                });
                ExecutionState::abandon();
                panic!("{}", message);
            }
        };

        let (future, waker, step_span) = ExecutionState::with(|state| {
            let step_span = span!(Level::DEBUG, "step", i = state.steps, task = task_id.0);
            state.last_task = Some(task_id);
            state.steps += 1;
            let task = state.get_mut(task_id);
            task.begin_poll();
            (Rc::clone(&task.future), task.waker(), step_span)
        });

        let ret = step_span.in_scope(|| {
            panic::catch_unwind(panic::AssertUnwindSafe(|| {
                let mut cx = Context::from_waker(&waker);
                future.borrow_mut().as_mut().poll(&mut cx)
            }))
        });

        let failure = ExecutionState::with(|state| {
            match ret {
                Ok(Poll::Ready(())) => {
                    trace!(task = task_id.0, "task finished");
                    state.get_mut(task_id).finish();
                    None
                }
                Ok(Poll::Pending) => {
                    state.get_mut(task_id).block_after_running();
                    None
                }
                Err(e) => {
                    let name = state.get(task_id).name();
                    let message = describe_failure(format!("panicked in task {:?}", name), state.seed);
                    Some((message, e))
                }
            }
        });

        if let Some((message, e)) = failure {
            // Tasks are dropped out here, not while the state is borrowed
            drop(future);
            ExecutionState::abandon();
            // Try to inject the seed into the panic payload if we can
            let payload: Box<dyn Any + Send> = match e.downcast::<String>() {
                Ok(panic_msg) => Box::new(format!("{}\noriginal panic: {}", message, panic_msg)),
                Err(e) => match e.downcast::<&'static str>() {
                    Ok(panic_msg) => Box::new(format!("{}\noriginal panic: {}", message, panic_msg)),
                    Err(panic) => panic,
                },
            };
            panic::resume_unwind(payload);
        }

        true
    }
}

/// `ExecutionState` contains the portion of a single execution's state that needs to be reachable
/// from within a task's execution. It tracks which tasks exist and their states, the clock and
/// pending timers, and the execution's random number generator.
pub(crate) struct ExecutionState {
    pub(crate) seed: u64,
    // invariant: tasks are never removed from this list until cleanup
    tasks: Vec<Task>,
    // the task polled most recently, which is what schedulers consider "current"
    last_task: Option<TaskId>,
    rng: Pcg64Mcg,
    pub(crate) clock: Clock,
    pub(crate) timers: TimerQueue,
    steps: usize,
}

impl ExecutionState {
    fn new(config: Config, seed: u64) -> Self {
        debug!(seed, clock = ?config.clock, "starting execution");
        Self {
            seed,
            tasks: Vec::new(),
            last_task: None,
            rng: Pcg64Mcg::seed_from_u64(seed),
            clock: Clock::new(config.clock),
            timers: TimerQueue::new(),
            steps: 0,
        }
    }

    /// Invoke a closure with access to the current execution state. Library code uses this to gain
    /// access to the state of the execution to influence scheduling (e.g. to register a timer).
    ///
    /// Panics if called outside of an execution.
    #[inline]
    pub(crate) fn with<F, T>(f: F) -> T
    where
        F: FnOnce(&mut ExecutionState) -> T,
    {
        assert!(
            EXECUTION_STATE.is_set(),
            "this operation must be called from within a dally execution"
        );
        EXECUTION_STATE.with(|cell| f(&mut *cell.borrow_mut()))
    }

    /// Like `with`, but returns `None` instead of panicking if there is no execution running
    #[inline]
    pub(crate) fn try_with<F, T>(f: F) -> Option<T>
    where
        F: FnOnce(&mut ExecutionState) -> T,
    {
        if EXECUTION_STATE.is_set() {
            Some(Self::with(f))
        } else {
            None
        }
    }

    /// Spawn a new task for a future. The new task is runnable immediately but will only be polled
    /// once the scheduler picks it.
    pub(crate) fn spawn(future: LocalBoxFuture<'static, ()>, name: Option<String>) -> TaskId {
        Self::with(|state| {
            let task_id = TaskId(state.tasks.len());
            let task = Task::new(future, task_id, name);
            trace!(task = task_id.0, name = %task.name(), "spawned task");
            state.tasks.push(task);
            task_id
        })
    }

    /// Prepare this ExecutionState to be dropped. Call this before dropping so that the tasks have
    /// a chance to run their drop handlers while `EXECUTION_STATE` is still in scope.
    fn cleanup() {
        // A slightly delicate dance here: we need to drop the tasks from outside of `Self::with`,
        // because a future's Drop impl might want to call back into `ExecutionState`.
        let mut tasks = Self::with(|state| std::mem::take(&mut state.tasks));

        for task in tasks.drain(..) {
            assert!(task.finished(), "execution finished but task is not");
            Rc::try_unwrap(task.future)
                .map_err(|_| ())
                .expect("couldn't cleanup a future");
        }
    }

    /// Drop every task of an execution that is being torn down by a panic
    fn abandon() {
        let tasks = Self::with(|state| std::mem::take(&mut state.tasks));
        drop(tasks);
    }

    /// Generate a random u64 from the execution's generator and return it.
    #[inline]
    pub(crate) fn next_u64() -> u64 {
        Self::with(|state| state.rng.next_u64())
    }

    /// Wake the given task. Wakers can outlive their task, so unknown ids are ignored.
    pub(crate) fn wake(&mut self, id: TaskId) {
        if let Some(task) = self.tasks.get_mut(id.0) {
            task.wake();
        }
    }

    pub(crate) fn get(&self, id: TaskId) -> &Task {
        self.tasks.get(id.0).unwrap()
    }

    pub(crate) fn get_mut(&mut self, id: TaskId) -> &mut Task {
        self.tasks.get_mut(id.0).unwrap()
    }

    /// Work out what the executor should do next. Choosing among runnable tasks is left to the
    /// caller, which consults the scheduler once the state is no longer borrowed.
    fn decide(&self) -> Decision {
        let runnable = self
            .tasks
            .iter()
            .filter(|t| t.runnable())
            .map(|t| t.id())
            .collect::<SmallVec<[_; MAX_INLINE_TASKS]>>();

        if !runnable.is_empty() {
            return Decision::Choose(runnable, self.last_task);
        }

        if self.tasks.iter().all(|t| t.finished()) {
            return Decision::Finished;
        }

        match self.timers.next_deadline() {
            Some(deadline) => Decision::Wait(deadline),
            None => Decision::Deadlock,
        }
    }
}
