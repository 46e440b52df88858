use std::cell::Cell;
use std::rc::Rc;

use crate::error::Error;

/// A logical clock for tracking scheduler time.
///
/// Ticks are abstract: they advance only when the loop driver enters the
/// timers phase with pending work, never from a wall clock. Clones share
/// the same underlying counter.
#[derive(Debug, Clone)]
pub struct Clock {
    ticks: Rc<Cell<u64>>,
}

impl Clock {
    /// Create a clock at tick zero.
    pub fn new() -> Self {
        Self {
            ticks: Rc::new(Cell::new(0)),
        }
    }

    /// Return the current tick.
    pub fn now(&self) -> u64 {
        self.ticks.get()
    }

    /// Advance the clock to `tick`.
    ///
    /// Ticks are monotonic; a target at or before the current tick is a
    /// no-op.
    pub fn advance_to(&self, tick: u64) {
        if tick > self.ticks.get() {
            self.ticks.set(tick);
        }
    }

    /// Compute the deadline `delay` ticks from now.
    ///
    /// The deadline is fixed at call time. Fails if it would overflow the
    /// tick counter, in which case no timer should be created.
    pub fn deadline_after(&self, delay: u64) -> Result<u64, Error> {
        self.ticks
            .get()
            .checked_add(delay)
            .ok_or_else(Error::deadline_overflow)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
