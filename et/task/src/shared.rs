//! Interrupt-safe sharing of one controller between ISR and poll contexts
//!
//! The controller's structures (channel, registry, timer queue) are owned
//! by one instance and mutated from both interrupt context (tick advance,
//! interrupt-sourced `queue`) and poll-loop context (register, arm,
//! handle). [`SharedEtask`] brackets every access with a
//! `critical-section` guard, realizing the mandatory interrupt-masked
//! window around structural mutation.

use core::cell::RefCell;
use critical_section::Mutex;
use et_core::{EtResult, EventId};

use crate::task::Etask;

/// A controller wrapped for ISR/poll-loop sharing
///
/// Suitable for a `static`: construction is `const`. Every operation runs
/// to completion inside one critical section; keep handlers short, since
/// interrupts are masked for the duration of the closure.
pub struct SharedEtask<C, const E: usize, const Q: usize> {
    inner: Mutex<RefCell<Etask<C, E, Q>>>,
}

impl<C, const E: usize, const Q: usize> SharedEtask<C, E, Q> {
    /// Create a new shared controller
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Etask::new())),
        }
    }

    /// Run `f` on the controller inside a critical section
    pub fn with<R>(&self, f: impl FnOnce(&mut Etask<C, E, Q>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Queue a deferred dispatch; safe from any context
    pub fn queue(&self, id: EventId) -> EtResult<()> {
        self.with(|et| et.queue(id))
    }

    /// Advance the tick and process expired timers; call from the system
    /// tick ISR
    pub fn advance_tick(&self, ctx: &mut C, delta: u32) {
        self.with(|et| et.advance_tick(ctx, delta));
    }

    /// Drain and dispatch queued events; call from the main poll loop
    ///
    /// The whole drain runs under the guard. Latency-sensitive systems
    /// can instead use [`SharedEtask::with`] to drain in smaller batches.
    pub fn handle(&self, ctx: &mut C) {
        self.with(|et| et.handle(ctx));
    }
}

impl<C, const E: usize, const Q: usize> Default for SharedEtask<C, E, Q> {
    fn default() -> Self {
        Self::new()
    }
}
