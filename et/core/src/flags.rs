//! Dispatch flags and callback pseudo-labels

use core::fmt;

/// How a callback is invoked when its event becomes due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Queue the id through the ring channel; the poll loop invokes the
    /// callback on the next `handle()` pass
    Deferred,
    /// Invoke the callback synchronously from the context that detected
    /// the trigger (often interrupt context) — must be short and ISR-safe
    Immediate,
}

impl Dispatch {
    /// Check for immediate ("hard") dispatch
    pub const fn is_immediate(self) -> bool {
        matches!(self, Dispatch::Immediate)
    }
}

/// Timer re-arm mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// Fire once and stay disarmed
    OneShot,
    /// Automatically re-arm with the same interval after each firing
    Periodic,
}

impl Repeat {
    /// Check for periodic re-arm
    pub const fn is_periodic(self) -> bool {
        matches!(self, Repeat::Periodic)
    }
}

/// Pseudo-label delivered alongside the event id on every dispatch
///
/// Ordinary queued, fired, and timed dispatches carry [`Label::Event`].
/// The remaining labels are reserved for the controller's state-machine
/// slot: `Enter`/`Exit` on transitions, `Poll` once per `handle()` pass
/// while a state is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    /// Ordinary event dispatch
    Event,
    /// State entered via `transition`
    Enter,
    /// State exited via `transition`
    Exit,
    /// Continuous polling of the active state
    Poll,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Event => write!(f, "Event"),
            Label::Enter => write!(f, "Enter"),
            Label::Exit => write!(f, "Exit"),
            Label::Poll => write!(f, "Poll"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Label {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Label::Event => defmt::write!(fmt, "Event"),
            Label::Enter => defmt::write!(fmt, "Enter"),
            Label::Exit => defmt::write!(fmt, "Exit"),
            Label::Poll => defmt::write!(fmt, "Poll"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Dispatch {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Dispatch::Deferred => defmt::write!(fmt, "Deferred"),
            Dispatch::Immediate => defmt::write!(fmt, "Immediate"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Repeat {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Repeat::OneShot => defmt::write!(fmt, "OneShot"),
            Repeat::Periodic => defmt::write!(fmt, "Periodic"),
        }
    }
}
