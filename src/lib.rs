#![deny(missing_debug_implementations, missing_docs)]

//! Dally gathers the results of randomly delayed tasks that run concurrently on a small,
//! single-threaded cooperative executor.
//!
//! ## Gathering delays
//!
//! The core operation launches `n` delay tasks at once. Each task sleeps for a duration drawn
//! uniformly from `[0, max_delay]` seconds and then yields that duration. The caller waits until
//! every task has finished and receives the durations sorted ascending:
//!
//! ```no_run
//! let delays = dally::collect(5, 2.0).unwrap();
//! assert_eq!(delays.len(), 5);
//! assert!(delays.windows(2).all(|w| w[0] <= w[1]));
//! ```
//!
//! Because the tasks run concurrently, the call above takes roughly as long as the *largest*
//! sampled delay, not the sum of all of them.
//!
//! Invalid arguments are reported rather than producing a malformed result:
//!
//! ```
//! assert!(dally::collect(-1, 2.0).is_err());
//! assert!(dally::collect(3, -0.5).is_err());
//! ```
//!
//! ## Running async code
//!
//! Dally's executor is not a general purpose runtime, but it can run any future. A [`Runner`] is
//! constructed from a [`Scheduler`](crate::scheduler::Scheduler), which picks the next task to
//! poll whenever more than one is runnable, and a [`Config`]. Inside an execution, [`asynch::spawn`]
//! adds tasks, [`time::sleep`] suspends one, and [`rand::thread_rng`] draws from the execution's
//! seeded generator.
//!
//! With a fixed seed and the virtual clock, an execution is fully reproducible and does not wait
//! in real time:
//!
//! ```
//! use dally::scheduler::RoundRobinScheduler;
//! use dally::time::ClockMode;
//! use dally::{delay, Config, Runner};
//!
//! let mut config = Config::new();
//! config.seed = Some(42);
//! config.clock = ClockMode::Virtual;
//!
//! let runner = Runner::new(RoundRobinScheduler::new(), config);
//! let first = runner.block_on(delay::wait_n(10, 60.0)).unwrap();
//! let second = runner.block_on(delay::wait_n(10, 60.0)).unwrap();
//! assert_eq!(first, second);
//! ```

pub mod asynch;
pub mod delay;
pub mod rand;
pub mod scheduler;
pub mod time;

mod error;
mod runtime;

pub use error::Error;
pub use runtime::runner::Runner;

use crate::scheduler::RoundRobinScheduler;
use crate::time::ClockMode;
use std::convert::TryInto;
use std::fmt::Display;
use std::future::Future;

/// Configuration parameters for an execution
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub struct Config {
    /// Seed for the execution's random number generator. If `None`, every execution draws a fresh
    /// seed from the operating system.
    pub seed: Option<u64>,

    /// Which clock sleeping tasks are measured against
    pub clock: ClockMode,
}

impl Config {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self {
            seed: None,
            clock: ClockMode::Real,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a future to completion on a fresh executor, using a round-robin scheduler and the default
/// configuration.
pub fn block_on<F>(future: F) -> F::Output
where
    F: Future + 'static,
    F::Output: 'static,
{
    let runner = Runner::new(RoundRobinScheduler::new(), Config::new());
    runner.block_on(future)
}

/// Run `n` random delays of at most `max_delay` seconds concurrently and return the observed
/// delays in ascending order.
///
/// This is a blocking wrapper around [`delay::wait_n`].
pub fn collect<N>(n: N, max_delay: f64) -> Result<Vec<f64>, Error>
where
    N: TryInto<usize> + Display + Copy + 'static,
{
    block_on(delay::wait_n(n, max_delay))
}
