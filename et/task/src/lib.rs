#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

//! # Etask Controller
//!
//! A single-threaded cooperative event/task dispatcher for
//! microcontrollers: id-keyed event registration over a balanced-tree
//! registry, deferred dispatch through a bounded ring channel, soft
//! timers ordered by a wraparound-safe monotonic tick, and a single
//! state-machine slot with enter/exit transitions.
//!
//! The concurrency model is interrupt-driven producers feeding a
//! poll-driven consumer on one CPU: ISRs call [`Etask::queue`] and
//! [`Etask::advance_tick`], the main loop calls [`Etask::handle`].
//! [`SharedEtask`] provides the critical-section bracket when both sides
//! share one instance.

#[cfg(test)]
extern crate std;

pub mod registry;
pub mod shared;
pub mod task;
pub mod timing;

pub use et_core::*;
pub use registry::AvlMap;
pub use shared::SharedEtask;
pub use task::{Callback, Etask, Invoke};
pub use timing::TimerQueue;

/// Default deferred-channel capacity for typical applications
pub const DEFAULT_QUEUE_CAPACITY: usize = 8;

/// Default event arena capacity for typical applications
pub const DEFAULT_EVENT_CAPACITY: usize = 32;
