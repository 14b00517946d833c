//! Millisecond clocks.
//!
//! Every component reads time from one [`Clock`] and derives its state from
//! `elapsed = now - start`, never from chained relative delays. The TUI uses
//! [`SystemClock`]; tests drive [`ManualClock`] by hand.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Source of "milliseconds since this clock's epoch".
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock anchored at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(ms: u64) -> Self {
        let clock = Self::new();
        clock.set(ms);
        clock
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}
