//! Event identifiers and the name-to-id hash

use core::fmt;

/// FNV-1a 32-bit offset basis
const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
/// FNV-1a 32-bit prime
const FNV_PRIME: u32 = 16_777_619;

/// Numeric event identifier
///
/// Events are registered and queued by a 32-bit id, typically derived from
/// a human-readable name via [`EventId::from_name`]. The hash constants are
/// stable; ids derived from the same name are identical across builds and
/// modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub u32);

impl EventId {
    /// Create an id from a raw value
    pub const fn new(id: u32) -> Self {
        EventId(id)
    }

    /// Get the raw id value
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Hash a name into an id (FNV-1a)
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut id = FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            id ^= bytes[i] as u32;
            id = id.wrapping_mul(FNV_PRIME);
            i += 1;
        }
        EventId(id)
    }
}

impl From<u32> for EventId {
    fn from(id: u32) -> Self {
        EventId(id)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({:#010x})", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EventId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "EventId({=u32:#x})", self.0);
    }
}
