//! Monotonic tick counter with wraparound-safe comparison
//!
//! The system's only notion of elapsed time is a 32-bit counter advanced
//! from a periodic hardware timer interrupt. It wraps at `2^32`; every
//! comparison in the framework therefore goes through the signed-subtraction
//! helpers below rather than `<` on the raw values.

use core::fmt;

/// Half of the tick range; differences below this are "in the past"
const HALF_RANGE: u32 = u32::MAX / 2;

/// Monotonic 32-bit tick counter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tick(pub u32);

impl Tick {
    /// Zero tick
    pub const ZERO: Self = Self(0);

    /// Create a tick value
    pub const fn new(ticks: u32) -> Self {
        Self(ticks)
    }

    /// Get the raw tick value
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Advance the counter, wrapping at the 32-bit boundary
    pub fn advance(&mut self, delta: u32) {
        self.0 = self.0.wrapping_add(delta);
    }

    /// Compute an absolute deadline `ticks` from now, wrapping
    pub const fn deadline_after(self, ticks: u32) -> Tick {
        Tick(self.0.wrapping_add(ticks))
    }

    /// Ticks elapsed since `previous`, tolerant of one wrap
    pub const fn elapsed_since(self, previous: Tick) -> u32 {
        self.0.wrapping_sub(previous.0)
    }

    /// Whether `deadline` has passed as of this tick
    ///
    /// Wraparound-safe: a deadline computed shortly before the counter
    /// wrapped compares as due shortly after the wrap.
    pub const fn is_due(self, deadline: Tick) -> bool {
        self.0.wrapping_sub(deadline.0) < HALF_RANGE
    }

    /// Whether this deadline sorts strictly before `other`
    ///
    /// Ordering under wraparound: `a` precedes `b` when the signed
    /// difference `a - b` is negative.
    pub const fn deadline_before(self, other: Tick) -> bool {
        (self.0.wrapping_sub(other.0) as i32) < 0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick:{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Tick {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "tick:{=u32}", self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_wraps() {
        let mut t = Tick::new(u32::MAX);
        t.advance(1);
        assert_eq!(t, Tick::ZERO);
        t.advance(5);
        assert_eq!(t.raw(), 5);
    }

    #[test]
    fn test_is_due_plain() {
        let now = Tick::new(100);
        assert!(now.is_due(Tick::new(100)));
        assert!(now.is_due(Tick::new(99)));
        assert!(!now.is_due(Tick::new(101)));
    }

    #[test]
    fn test_is_due_across_wrap() {
        // Deadline set before the wrap, checked after it
        let deadline = Tick::new(0xFFFF_FFF0).deadline_after(32);
        assert_eq!(deadline.raw(), 0x10);
        assert!(!Tick::new(0xFFFF_FFFE).is_due(deadline));
        assert!(!Tick::new(0x0F).is_due(deadline));
        assert!(Tick::new(0x10).is_due(deadline));
        assert!(Tick::new(0x11).is_due(deadline));
    }

    #[test]
    fn test_deadline_ordering_across_wrap() {
        let early = Tick::new(0xFFFF_FFFE);
        let late = Tick::new(0x2); // wrapped, but logically later
        assert!(early.deadline_before(late));
        assert!(!late.deadline_before(early));
        assert!(!early.deadline_before(early));
    }

    #[test]
    fn test_elapsed_since() {
        assert_eq!(Tick::new(10).elapsed_since(Tick::new(4)), 6);
        assert_eq!(Tick::new(2).elapsed_since(Tick::new(0xFFFF_FFFE)), 4);
    }
}
