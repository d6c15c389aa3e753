#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

//! # Etask Ring Channel
//!
//! A fixed-capacity FIFO channel used to hand event identifiers from
//! "notify" context (typically an ISR) to "handle" context (the poll loop).
//!
//! Wrap detection uses a one-bit mirror flag per index alongside the index
//! itself, so `read == write` is unambiguous: equal mirrors mean empty,
//! differing mirrors mean full. All `N` slots are therefore usable.
//!
//! The channel has no internal locking. It is safe only under
//! single-producer/single-consumer discipline per instance; producers that
//! race an ISR must serialize their pushes externally (see
//! `et_task::SharedEtask` for the critical-section wrapper).

use et_core::{EtError, EtResult};

/// Bounded FIFO channel with mirror-bit wrap detection
pub struct RingChannel<T, const N: usize> {
    buf: [Option<T>; N],
    read_index: usize,
    read_mirror: bool,
    write_index: usize,
    write_mirror: bool,
}

impl<T, const N: usize> RingChannel<T, N> {
    const EMPTY_SLOT: Option<T> = None;

    /// Create a new empty channel
    pub const fn new() -> Self {
        Self {
            buf: [Self::EMPTY_SLOT; N],
            read_index: 0,
            read_mirror: false,
            write_index: 0,
            write_mirror: false,
        }
    }

    /// Number of elements currently queued
    pub fn used(&self) -> usize {
        if self.read_index == self.write_index {
            // Empty or full according to the mirror flags
            if self.read_mirror == self.write_mirror {
                0
            } else {
                N
            }
        } else if self.write_index > self.read_index {
            self.write_index - self.read_index
        } else {
            N - (self.read_index - self.write_index)
        }
    }

    /// Number of free slots
    pub fn space(&self) -> usize {
        N - self.used()
    }

    /// Maximum capacity of the channel
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Check if the channel is empty
    pub fn is_empty(&self) -> bool {
        self.used() == 0
    }

    /// Check if the channel is full
    pub fn is_full(&self) -> bool {
        self.used() == N
    }

    /// Push one element to the back of the channel
    ///
    /// Fails with [`EtError::Busy`] when the channel is full. This is the
    /// sole backpressure signal: callers treat it as "event dropped, queue
    /// saturated" and must not block or retry synchronously.
    pub fn write(&mut self, value: T) -> EtResult<()> {
        if self.is_full() {
            return Err(EtError::Busy);
        }

        self.buf[self.write_index] = Some(value);
        if self.write_index + 1 == N {
            self.write_index = 0;
            self.write_mirror = !self.write_mirror;
        } else {
            self.write_index += 1;
        }
        Ok(())
    }

    /// Pop one element from the front of the channel
    ///
    /// Returns `None` when the channel is empty.
    pub fn read(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        let value = self.buf[self.read_index].take();
        if self.read_index + 1 == N {
            self.read_index = 0;
            self.read_mirror = !self.read_mirror;
        } else {
            self.read_index += 1;
        }
        value
    }

    /// Discard all queued elements
    pub fn clear(&mut self) {
        for slot in self.buf.iter_mut() {
            *slot = None;
        }
        self.read_index = 0;
        self.read_mirror = false;
        self.write_index = 0;
        self.write_mirror = false;
    }
}

impl<T, const N: usize> Default for RingChannel<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut ch: RingChannel<u32, 4> = RingChannel::new();

        assert!(ch.is_empty());
        ch.write(10).unwrap();
        ch.write(20).unwrap();
        ch.write(30).unwrap();
        assert_eq!(ch.used(), 3);

        assert_eq!(ch.read(), Some(10));
        assert_eq!(ch.read(), Some(20));
        assert_eq!(ch.read(), Some(30));
        assert_eq!(ch.read(), None);
        assert!(ch.is_empty());
    }

    #[test]
    fn test_full_capacity_usable() {
        // The mirror bit disambiguates full from empty, so all N slots hold data
        let mut ch: RingChannel<u32, 4> = RingChannel::new();

        for i in 0..4 {
            ch.write(i).unwrap();
        }
        assert!(ch.is_full());
        assert_eq!(ch.used(), 4);
        assert_eq!(ch.space(), 0);
    }

    #[test]
    fn test_backpressure_no_corruption() {
        let mut ch: RingChannel<u32, 4> = RingChannel::new();

        for i in 0..4 {
            ch.write(i).unwrap();
        }
        // Saturated: the next write is rejected, queued data stays intact
        assert_eq!(ch.write(99), Err(EtError::Busy));
        assert_eq!(ch.write(100), Err(EtError::Busy));

        for i in 0..4 {
            assert_eq!(ch.read(), Some(i));
        }
        assert_eq!(ch.read(), None);
    }

    #[test]
    fn test_wrap_many_times() {
        let mut ch: RingChannel<u32, 3> = RingChannel::new();

        // Interleave so both indices cross the boundary repeatedly
        for round in 0..20u32 {
            ch.write(round * 2).unwrap();
            ch.write(round * 2 + 1).unwrap();
            assert_eq!(ch.read(), Some(round * 2));
            assert_eq!(ch.read(), Some(round * 2 + 1));
            assert!(ch.is_empty());
        }
    }

    #[test]
    fn test_refill_after_drain() {
        let mut ch: RingChannel<u32, 2> = RingChannel::new();

        ch.write(1).unwrap();
        ch.write(2).unwrap();
        assert_eq!(ch.write(3), Err(EtError::Busy));

        assert_eq!(ch.read(), Some(1));
        ch.write(3).unwrap();
        assert!(ch.is_full());
        assert_eq!(ch.read(), Some(2));
        assert_eq!(ch.read(), Some(3));
    }

    #[test]
    fn test_clear() {
        let mut ch: RingChannel<u32, 4> = RingChannel::new();

        ch.write(1).unwrap();
        ch.write(2).unwrap();
        ch.clear();
        assert!(ch.is_empty());
        assert_eq!(ch.read(), None);

        ch.write(7).unwrap();
        assert_eq!(ch.read(), Some(7));
    }
}
