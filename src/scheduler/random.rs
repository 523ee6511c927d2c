use crate::scheduler::{Scheduler, TaskId};
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A scheduler that randomly chooses a runnable task at each context switch.
///
/// The RNG used is contained within the scheduler, allowing it to be reused across executions in
/// order to get different random interleavings each time.
#[derive(Debug)]
pub struct RandomScheduler {
    rng: Pcg64Mcg,
}

impl RandomScheduler {
    /// Construct a new RandomScheduler with a freshly seeded RNG.
    pub fn new() -> Self {
        Self::new_from_seed(OsRng.next_u64())
    }

    /// Construct a new RandomScheduler with a given seed.
    ///
    /// Two RandomSchedulers initialized with the same seed will make the same scheduling decisions
    /// when executing the same workloads.
    pub fn new_from_seed(seed: u64) -> Self {
        Self {
            rng: Pcg64Mcg::seed_from_u64(seed),
        }
    }
}

impl Default for RandomScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for RandomScheduler {
    fn next_task(&mut self, runnable: &[TaskId], _current: Option<TaskId>) -> TaskId {
        *runnable.choose(&mut self.rng).unwrap()
    }
}
