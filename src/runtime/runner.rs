use crate::runtime::execution::Execution;
use crate::scheduler::Scheduler;
use crate::Config;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use tracing::{span, Level};

/// A `Runner` is the entry-point for running futures on dally's executor.
///
/// It takes as input a `Scheduler`, which resolves the order in which runnable tasks are polled,
/// and a `Config`. Each call to [`Runner::block_on`] is a fresh execution; the scheduler lives
/// across executions, so a randomized scheduler makes different choices each time.
#[derive(Debug)]
pub struct Runner<S> {
    scheduler: Rc<RefCell<S>>,
    config: Config,
    executions: Cell<usize>,
}

impl<S: Scheduler + 'static> Runner<S> {
    /// Construct a new `Runner` that will use the given `Scheduler` and configuration.
    pub fn new(scheduler: S, config: Config) -> Self {
        Self {
            scheduler: Rc::new(RefCell::new(scheduler)),
            config,
            executions: Cell::new(0),
        }
    }

    /// Run a future to completion on the current thread, along with every task it spawns, and
    /// return its output.
    ///
    /// If any task panics, the whole execution is abandoned and the panic is propagated to the
    /// caller, annotated with the name of the panicking task and the execution's seed.
    pub fn block_on<F>(&self, future: F) -> F::Output
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let i = self.executions.get();
        self.executions.set(i + 1);

        let scheduler: Rc<RefCell<dyn Scheduler>> = self.scheduler.clone();
        let execution = Execution::new(scheduler, self.config);
        span!(Level::DEBUG, "execution", i).in_scope(|| execution.run(future))
    }

    /// The configuration executions run with
    pub fn config(&self) -> &Config {
        &self.config
    }
}
