//! Deadline-ordered timer queue
//!
//! Armed timers are kept sorted by absolute deadline under the
//! wraparound-safe comparison, so expiry processing walks from the front
//! and stops at the first entry that is not yet due. Entries refer to
//! registry records by stable handle.

use et_core::{EtError, EtResult, EventId, Tick};
use heapless::Vec;

/// One armed timer: an absolute deadline plus the record it belongs to
#[derive(Debug, Clone, Copy)]
pub struct Armed {
    /// Absolute tick at which the timer fires
    pub deadline: Tick,
    /// Registry handle of the event record
    pub handle: usize,
    /// Event id (carried so expiry can queue without a registry lookup)
    pub id: EventId,
}

/// Fixed-capacity queue of armed timers, ordered by deadline
pub struct TimerQueue<const N: usize> {
    entries: Vec<Armed, N>,
}

impl<const N: usize> TimerQueue<N> {
    /// Create a new empty queue
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Number of armed timers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no timers are armed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Link a timer at its sorted position
    ///
    /// Insertion scans from the front and places the entry before the
    /// first strictly later deadline, so timers sharing a deadline fire
    /// in arm order.
    pub fn arm(&mut self, entry: Armed) -> EtResult<()> {
        let position = self
            .entries
            .iter()
            .position(|existing| entry.deadline.deadline_before(existing.deadline))
            .unwrap_or(self.entries.len());
        self.entries
            .insert(position, entry)
            .map_err(|_| EtError::NoMemory)
    }

    /// Unlink the timer for `handle`, if armed
    pub fn disarm(&mut self, handle: usize) -> bool {
        match self.entries.iter().position(|entry| entry.handle == handle) {
            Some(position) => {
                self.entries.remove(position);
                true
            }
            None => false,
        }
    }

    /// Pop the earliest timer whose deadline has passed as of `now`
    ///
    /// Returns `None` once the front entry is not yet due; the queue is
    /// sorted, so no later entry can be due either.
    pub fn pop_due(&mut self, now: Tick) -> Option<Armed> {
        let front = self.entries.first()?;
        if now.is_due(front.deadline) {
            Some(self.entries.remove(0))
        } else {
            None
        }
    }

    /// Whether `handle` currently has an armed timer
    pub fn is_armed(&self, handle: usize) -> bool {
        self.entries.iter().any(|entry| entry.handle == handle)
    }

    /// Deadline of the armed timer for `handle`, if any
    pub fn deadline_of(&self, handle: usize) -> Option<Tick> {
        self.entries
            .iter()
            .find(|entry| entry.handle == handle)
            .map(|entry| entry.deadline)
    }

    /// Unlink all timers
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<const N: usize> Default for TimerQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
