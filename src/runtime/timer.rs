use crate::time::ClockMode;
use smallvec::SmallVec;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::task::Waker;
use std::time::{Duration, Instant};
use tracing::trace;

/// The clock an execution measures deadlines against.
///
/// A real clock reads `Instant::now()` and waits for deadlines by putting the thread to sleep. A
/// virtual clock starts at the moment the execution begins and only moves when the executor has
/// nothing left to run, at which point it jumps straight to the earliest deadline.
#[derive(Debug)]
pub(crate) struct Clock {
    mode: ClockMode,
    start: Instant,
    elapsed: Duration,
}

impl Clock {
    pub(crate) fn new(mode: ClockMode) -> Self {
        Self {
            mode,
            start: Instant::now(),
            elapsed: Duration::ZERO,
        }
    }

    pub(crate) fn now(&self) -> Instant {
        match self.mode {
            ClockMode::Real => Instant::now(),
            ClockMode::Virtual => self.start + self.elapsed,
        }
    }

    /// Move the clock forward until it reaches `deadline`. Does nothing if the deadline has
    /// already passed.
    pub(crate) fn advance_to(&mut self, deadline: Instant) {
        let now = self.now();
        if deadline <= now {
            return;
        }
        match self.mode {
            ClockMode::Real => std::thread::sleep(deadline - now),
            ClockMode::Virtual => self.elapsed = deadline - self.start,
        }
    }
}

// Timers fire in deadline order; ties go to the timer registered first.
struct TimerEntry {
    deadline: Instant,
    id: u64,
    waker: Waker,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.deadline, self.id).cmp(&(other.deadline, other.id))
    }
}

/// A min-heap of pending timers, each holding the waker to invoke once its deadline passes.
#[derive(Default)]
pub(crate) struct TimerQueue {
    entries: BinaryHeap<Reverse<TimerEntry>>,
    next_id: u64,
}

impl TimerQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a waker to be woken once `deadline` has passed
    pub(crate) fn register(&mut self, deadline: Instant, waker: Waker) {
        let id = self.next_id;
        self.next_id += 1;
        trace!(timer = id, ?deadline, "registered timer");
        self.entries.push(Reverse(TimerEntry { deadline, id, waker }));
    }

    /// The earliest pending deadline, if any
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.entries.peek().map(|Reverse(entry)| entry.deadline)
    }

    /// Remove every timer whose deadline is at or before `now`, returning their wakers in firing
    /// order. The caller must wake them outside of the execution state.
    pub(crate) fn expire(&mut self, now: Instant) -> SmallVec<[Waker; 8]> {
        let mut expired = SmallVec::new();
        while let Some(Reverse(entry)) = self.entries.peek() {
            if entry.deadline > now {
                break;
            }
            let Reverse(entry) = self.entries.pop().unwrap();
            trace!(timer = entry.id, "timer fired");
            expired.push(entry.waker);
        }
        expired
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
