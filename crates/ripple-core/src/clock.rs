use std::cell::Cell;
use std::rc::Rc;

use web_time::{Duration, Instant};

// Scheduler clock
pub trait Clock: 'static {
    fn now(&self) -> Instant;
}

pub struct SystemClock;
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A test clock you can drive deterministically.
///
/// Clones share the same time, so a test can keep one handle and give the
/// other to the engine.
#[derive(Clone)]
pub struct TestClock {
    t: Rc<Cell<Instant>>,
}

impl TestClock {
    pub fn new() -> Self {
        Self::at(Instant::now())
    }

    pub fn at(t: Instant) -> Self {
        Self {
            t: Rc::new(Cell::new(t)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.t.set(self.t.get() + by);
    }

    pub fn set(&self, t: Instant) {
        self.t.set(t);
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        self.t.get()
    }
}
