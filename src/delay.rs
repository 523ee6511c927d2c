//! Randomly delayed tasks, and the collector that gathers their results.
//!
//! A delay task sleeps for a duration drawn from `[0, max_delay]` seconds and yields that
//! duration. The [`Collector`] launches `n` of them at once, waits for all of them, and returns the
//! yielded durations sorted ascending. Since the tasks sleep concurrently, gathering `n` delays
//! takes about as long as the largest one.
//!
//! Where the delays come from is up to a [`DelaySource`]; [`RandomDelay`] samples them uniformly
//! from the execution's seeded generator. The free functions [`wait_random`], [`wait_n`],
//! [`task_wait_n`] and [`measure_time`] all use it.

use crate::asynch::{self, JoinHandle};
use crate::rand::thread_rng;
use crate::time;
use crate::Error;
use futures::future::{self, LocalBoxFuture};
use rand::distributions::{Distribution, Uniform};
use std::convert::TryInto;
use std::fmt::{self, Display};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace};

/// A factory for delay tasks.
///
/// Given a delay bound, a source produces a future that pauses for some time and then yields a
/// value in `[0, max_delay]`, usually the number of seconds it paused for. The bound handed to
/// [`DelaySource::delay`] has already been validated: it is finite and non-negative.
pub trait DelaySource {
    /// The future produced for one delay task
    type Delay: Future<Output = Result<f64, Error>> + 'static;

    /// Create a new delay task bounded by `max_delay` seconds
    fn delay(&self, max_delay: f64) -> Self::Delay;
}

/// The default [`DelaySource`]: sleeps for a duration drawn uniformly from `[0, max_delay]`
/// seconds using [`thread_rng`], and yields that duration.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomDelay;

impl DelaySource for RandomDelay {
    type Delay = LocalBoxFuture<'static, Result<f64, Error>>;

    fn delay(&self, max_delay: f64) -> Self::Delay {
        Box::pin(sample_and_sleep(max_delay))
    }
}

async fn sample_and_sleep(max_delay: f64) -> Result<f64, Error> {
    let delay = Uniform::new_inclusive(0.0, max_delay).sample(&mut thread_rng());
    let duration = Duration::try_from_secs_f64(delay).map_err(|e| Error::Task(e.to_string()))?;
    trace!(delay, "sleeping");
    time::sleep(duration).await;
    Ok(delay)
}

/// Gathers the results of concurrently running delay tasks.
#[derive(Clone, Debug, Default)]
pub struct Collector<S = RandomDelay> {
    source: S,
}

impl<S: DelaySource> Collector<S> {
    /// Create a collector that draws its delay tasks from `source`
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Run `n` delay tasks bounded by `max_delay` seconds concurrently, wait for all of them, and
    /// return their results sorted ascending.
    ///
    /// The tasks are polled together from the calling task. If any of them fails, the collector
    /// stops waiting for the rest and returns that error; no partial result is returned.
    ///
    /// Fails with [`Error::InvalidArgument`] before starting any task if `n` is negative (or
    /// otherwise not a valid `usize`) or `max_delay` is negative, not finite, or longer than
    /// [`time::MAX_SLEEP`].
    pub async fn collect<N>(&self, n: N, max_delay: f64) -> Result<Vec<f64>, Error>
    where
        N: TryInto<usize> + Display + Copy,
    {
        let n = task_count(n)?;
        let max_delay = delay_bound(max_delay)?;
        debug!(n, max_delay, "gathering delays");

        let mut delays = future::try_join_all((0..n).map(|_| self.source.delay(max_delay))).await?;
        delays.sort_by(f64::total_cmp);

        debug!(n, longest = ?delays.last(), "gathered delays");
        Ok(delays)
    }

    /// Like [`Collector::collect`], but spawns every delay task as its own executor task and joins
    /// on their handles.
    ///
    /// Every task is awaited even after one of them fails; the first failure (in spawn order) is
    /// then returned.
    pub async fn collect_spawned<N>(&self, n: N, max_delay: f64) -> Result<Vec<f64>, Error>
    where
        N: TryInto<usize> + Display + Copy,
    {
        let n = task_count(n)?;
        let max_delay = delay_bound(max_delay)?;
        debug!(n, max_delay, "spawning delay tasks");

        let handles: Vec<JoinHandle<Result<f64, Error>>> = (0..n)
            .map(|i| asynch::spawn_named(format!("delay-{}", i), self.source.delay(max_delay)))
            .collect();

        let mut delays = Vec::with_capacity(n);
        let mut failure = None;
        for handle in handles {
            match handle.await {
                Ok(delay) => delays.push(delay),
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        delays.sort_by(f64::total_cmp);
        Ok(delays)
    }
}

/// Sleep for a random duration of at most `max_delay` seconds and return that duration.
pub async fn wait_random(max_delay: f64) -> Result<f64, Error> {
    let max_delay = delay_bound(max_delay)?;
    RandomDelay.delay(max_delay).await
}

/// Run `n` random delays of at most `max_delay` seconds concurrently and return them in ascending
/// order. See [`Collector::collect`].
pub async fn wait_n<N>(n: N, max_delay: f64) -> Result<Vec<f64>, Error>
where
    N: TryInto<usize> + Display + Copy,
{
    Collector::new(RandomDelay).collect(n, max_delay).await
}

/// Like [`wait_n`], but with every delay running as a separately spawned task. See
/// [`Collector::collect_spawned`].
pub async fn task_wait_n<N>(n: N, max_delay: f64) -> Result<Vec<f64>, Error>
where
    N: TryInto<usize> + Display + Copy,
{
    Collector::new(RandomDelay).collect_spawned(n, max_delay).await
}

/// Measure how long [`wait_n`] takes on the execution's clock, divided by `n`. Returns zero when
/// `n` is zero.
pub async fn measure_time<N>(n: N, max_delay: f64) -> Result<Duration, Error>
where
    N: TryInto<usize> + Display + Copy,
{
    let n = task_count(n)?;
    let start = time::now();
    wait_n(n, max_delay).await?;
    let elapsed = time::now() - start;

    if n == 0 {
        Ok(Duration::ZERO)
    } else {
        Ok(elapsed.div_f64(n as f64))
    }
}

fn task_count<N>(n: N) -> Result<usize, Error>
where
    N: TryInto<usize> + Display + Copy,
{
    n.try_into().map_err(|_| invalid("n", n))
}

fn delay_bound(max_delay: f64) -> Result<f64, Error> {
    // Anything longer than `MAX_SLEEP` would sleep for less than the value it reports
    if max_delay >= 0.0 && max_delay <= time::MAX_SLEEP.as_secs_f64() {
        // normalizes -0.0
        Ok(max_delay + 0.0)
    } else {
        Err(invalid("max_delay", max_delay))
    }
}

fn invalid(name: &'static str, value: impl fmt::Display) -> Error {
    Error::InvalidArgument {
        name,
        value: value.to_string(),
    }
}
