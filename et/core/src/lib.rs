#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

//! # Etask Core
//!
//! Core types for the etask cooperative event/task dispatch framework.
//! This crate provides the identifiers, tick arithmetic, and dispatch
//! flags shared by every layer of the framework.

use core::fmt;

pub mod flags;
pub mod id;
pub mod tick;

pub use flags::*;
pub use id::*;
pub use tick::*;

/// Framework version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type used throughout the etask framework
pub type EtResult<T> = Result<T, EtError>;

/// Error types for etask framework operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtError {
    /// Resource already in use: duplicate event id, or channel full
    Busy,
    /// Lookup miss: unknown event id
    NotFound,
    /// Malformed argument (e.g. zero ticks for a timer registration)
    Invalid,
    /// Event arena or timer queue exhausted
    NoMemory,
}

impl fmt::Display for EtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtError::Busy => write!(f, "Resource busy"),
            EtError::NotFound => write!(f, "Event not found"),
            EtError::Invalid => write!(f, "Invalid argument"),
            EtError::NoMemory => write!(f, "Out of memory"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EtError {}

#[cfg(feature = "defmt")]
impl defmt::Format for EtError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            EtError::Busy => defmt::write!(fmt, "Busy"),
            EtError::NotFound => defmt::write!(fmt, "NotFound"),
            EtError::Invalid => defmt::write!(fmt, "Invalid"),
            EtError::NoMemory => defmt::write!(fmt, "NoMemory"),
        }
    }
}
