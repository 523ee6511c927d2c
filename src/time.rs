//! Timing primitives for tasks running on dally's executor.
//!
//! Every execution owns a clock, chosen by [`Config::clock`](crate::Config::clock). With
//! [`ClockMode::Real`], sleeping tasks wait in real time. Due timers fire before every scheduling
//! decision, so a sleeper wakes on time even while other tasks stay busy; when every task is
//! asleep the executor parks the thread until the earliest deadline. With [`ClockMode::Virtual`],
//! time only moves when every task is asleep, and then jumps straight to the earliest deadline,
//! so long sleeps complete instantly while keeping their relative order.

use crate::runtime::execution::ExecutionState;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

/// Which clock an execution measures time against
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockMode {
    /// Wall-clock time; sleeps take as long as they say
    Real,
    /// Simulated time that advances only when every task is waiting on a timer
    Virtual,
}

/// The longest duration [`sleep`] honours exactly, roughly thirty years. Longer sleeps are
/// shortened to this, which keeps every deadline representable as an `Instant`.
pub const MAX_SLEEP: Duration = Duration::from_secs(86400 * 365 * 30);

/// The current time according to the execution's clock.
pub fn now() -> Instant {
    ExecutionState::with(|state| state.clock.now())
}

/// Waits until `duration` has elapsed on the execution's clock. Durations above [`MAX_SLEEP`] are
/// capped at it.
pub fn sleep(duration: Duration) -> Sleep {
    sleep_until(now() + duration.min(MAX_SLEEP))
}

/// Waits until the execution's clock reaches `deadline`.
pub fn sleep_until(deadline: Instant) -> Sleep {
    Sleep { deadline, waker: None }
}

/// Future returned by [`sleep`] and [`sleep_until`].
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Sleep {
    deadline: Instant,
    // The waker most recently registered with the timer queue
    waker: Option<Waker>,
}

impl Sleep {
    /// The instant at which this future completes
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Whether the deadline has been reached
    pub fn is_elapsed(&self) -> bool {
        now() >= self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        ExecutionState::with(|state| {
            if state.clock.now() >= this.deadline {
                return Poll::Ready(());
            }

            let registered = matches!(&this.waker, Some(waker) if waker.will_wake(cx.waker()));
            if !registered {
                let waker = cx.waker().clone();
                state.timers.register(this.deadline, waker.clone());
                this.waker = Some(waker);
            }
            Poll::Pending
        })
    }
}
