//! Offset scheduler shared by the boot player, the power-on animation, the
//! glitch generator and the launch control.
//!
//! A [`Timeline`] holds one-shot events keyed by an absolute millisecond
//! offset. [`Timeline::drain_due`] hands back everything whose offset has been
//! reached, ordered by offset and then by insertion order, and forgets it.
//! Teardown is [`Timeline::clear`]: nothing scheduled survives it.
//!
//! [`Interval`] is the periodic counterpart used for the random trials.

/// Handle returned by [`Timeline::schedule`], usable with [`Timeline::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry<E> {
    id: TimerId,
    due_ms: u64,
    event: E,
}

/// One-shot events ordered by due time.
#[derive(Debug)]
pub struct Timeline<E> {
    // Kept sorted by (due_ms, id); ids grow monotonically so ties keep
    // insertion order.
    entries: Vec<Entry<E>>,
    next_id: u64,
}

impl<E> Default for Timeline<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Timeline<E> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    /// Schedule `event` to come due at `due_ms`.
    pub fn schedule(&mut self, due_ms: u64, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let pos = self
            .entries
            .partition_point(|e| (e.due_ms, e.id) <= (due_ms, id));
        self.entries.insert(pos, Entry { id, due_ms, event });
        id
    }

    /// Cancel a pending event. Returns false if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Drop every pending event.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove and return every event with `due_ms <= now_ms`.
    pub fn drain_due(&mut self, now_ms: u64) -> Vec<E> {
        let split = self.entries.partition_point(|e| e.due_ms <= now_ms);
        self.entries.drain(..split).map(|e| e.event).collect()
    }

    /// Remove and return the earliest due event, if any is due.
    ///
    /// Useful when handling one event can schedule another that is already
    /// due at `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, E)> {
        match self.entries.first() {
            Some(first) if first.due_ms <= now_ms => {
                let e = self.entries.remove(0);
                Some((e.due_ms, e.event))
            }
            _ => None,
        }
    }

    pub fn next_due(&self) -> Option<u64> {
        self.entries.first().map(|e| e.due_ms)
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Periodic trigger anchored at a start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    period_ms: u64,
    next_due_ms: u64,
}

impl Interval {
    /// First firing is one full period after `start_ms`.
    pub fn new(period_ms: u64, start_ms: u64) -> Self {
        let period_ms = period_ms.max(1);
        Self {
            period_ms,
            next_due_ms: start_ms.saturating_add(period_ms),
        }
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// Number of periods that completed since the last call, advancing the
    /// interval past `now_ms`.
    pub fn fire_count(&mut self, now_ms: u64) -> u64 {
        if now_ms < self.next_due_ms {
            return 0;
        }
        let n = (now_ms - self.next_due_ms) / self.period_ms + 1;
        self.next_due_ms += n * self.period_ms;
        n
    }
}
