//! Time capabilities: reading the clock and scheduling timeouts.

use core_events::TimerId;
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// High-resolution monotonic time source.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-driven clock. Clones share the same reading.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    elapsed: Rc<Cell<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            elapsed: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }

    /// Jump to `at` past the base instant. Moving backwards is ignored.
    pub fn set(&self, at: Duration) {
        if at >= self.elapsed.get() {
            self.elapsed.set(at);
        }
    }

    pub fn base(&self) -> Instant {
        self.base
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.elapsed.get()
    }
}

/// Host capability: one-shot timeouts delivered back as `Event::Timeout(id)`.
pub trait TimerHost {
    fn schedule(&mut self, id: TimerId, after: Duration);
    /// Cancel a pending timeout. Unknown or already fired ids are ignored.
    fn cancel(&mut self, id: TimerId);
}

impl<T: TimerHost + ?Sized> TimerHost for &mut T {
    fn schedule(&mut self, id: TimerId, after: Duration) {
        (**self).schedule(id, after)
    }
    fn cancel(&mut self, id: TimerId) {
        (**self).cancel(id)
    }
}
