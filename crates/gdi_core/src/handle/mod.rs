//! Opaque object handles
//!
//! A handle is a 32-bit value whose low 16 bits select a slot in the
//! [`HandleTable`] and whose high 16 bits carry that slot's generation at the
//! time of allocation:
//!
//! ```text
//!  31             16 15              0
//! +-----------------+-----------------+
//! |   generation    |   slot index    |
//! +-----------------+-----------------+
//! ```
//!
//! Components that only keep the low half (a "short" handle) recover the
//! canonical value with [`HandleTable::promote`]. The layout is part of the
//! external contract and must not change.

mod table;

pub use table::{HandleTable, SlotInfo};

use std::fmt;

/// Slots below this index are never handed out, so small integers are never valid handles
pub const FIRST_HANDLE_INDEX: u16 = 32;

/// Largest table the 16-bit index field can address
pub const MAX_HANDLE_CAPACITY: usize = 1 << 16;

/// Generation value that never appears in a live handle
pub const INVALID_GENERATION: u16 = 0;

/// First generation handed out by a fresh slot, and the value wraparound returns to
pub const FIRST_GENERATION: u16 = 1;

/// Last generation before wraparound
pub const MAX_GENERATION: u16 = u16::MAX;

/// Generation that follows `generation`, skipping [`INVALID_GENERATION`]
pub const fn next_generation(generation: u16) -> u16 {
    if generation >= MAX_GENERATION || generation < FIRST_GENERATION {
        FIRST_GENERATION
    } else {
        generation + 1
    }
}

/// Opaque reference to an object in the handle table
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32);

impl Handle {
    /// The "no object" value
    pub const NULL: Self = Self(0);

    /// Compose a handle from a slot index and generation
    pub const fn new(index: u16, generation: u16) -> Self {
        Self((index as u32) | ((generation as u32) << 16))
    }

    /// Reinterpret a raw 32-bit value
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw 32-bit value
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Slot index
    pub const fn index(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Generation bits, zero for a short handle
    pub const fn generation(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Whether this is [`Handle::NULL`]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Whether the generation bits were stripped
    pub const fn is_short(self) -> bool {
        self.generation() == INVALID_GENERATION
    }

    /// The index-only form of this handle
    pub const fn to_short(self) -> Self {
        Self(self.0 & 0xFFFF)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:#010x})", self.0)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Object type tag stored in a live table slot
///
/// Values match the classic `OBJ_*` constants; zero is reserved for free slots.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// Pen
    Pen = 1,
    /// Brush
    Brush = 2,
    /// Device context bound to a real device
    Dc = 3,
    /// Palette
    Palette = 5,
    /// Logical font
    Font = 6,
    /// Bitmap
    Bitmap = 7,
    /// Region
    Region = 8,
    /// Memory (compatible) device context
    MemDc = 10,
}

impl ObjectType {
    /// Numeric tag
    pub const fn tag(self) -> u16 {
        self as u16
    }

    /// Parse a numeric tag; zero and unknown tags yield `None`
    pub const fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            1 => Some(Self::Pen),
            2 => Some(Self::Brush),
            3 => Some(Self::Dc),
            5 => Some(Self::Palette),
            6 => Some(Self::Font),
            7 => Some(Self::Bitmap),
            8 => Some(Self::Region),
            10 => Some(Self::MemDc),
            _ => None,
        }
    }

    /// Whether the tag names any kind of device context
    pub const fn is_dc(self) -> bool {
        matches!(self, Self::Dc | Self::MemDc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_layout() {
        let handle = Handle::new(0x1234, 0x00AB);
        assert_eq!(handle.raw(), 0x00AB_1234);
        assert_eq!(handle.index(), 0x1234);
        assert_eq!(handle.generation(), 0x00AB);
        assert!(!handle.is_short());
        assert_eq!(handle.to_short().raw(), 0x1234);
        assert!(handle.to_short().is_short());
        assert!(Handle::NULL.is_null());
    }

    #[test]
    fn test_next_generation_skips_invalid() {
        assert_eq!(next_generation(INVALID_GENERATION), FIRST_GENERATION);
        assert_eq!(next_generation(1), 2);
        assert_eq!(next_generation(MAX_GENERATION), FIRST_GENERATION);
    }

    #[test]
    fn test_object_type_tags() {
        for kind in [
            ObjectType::Pen,
            ObjectType::Brush,
            ObjectType::Dc,
            ObjectType::Palette,
            ObjectType::Font,
            ObjectType::Bitmap,
            ObjectType::Region,
            ObjectType::MemDc,
        ] {
            assert_eq!(ObjectType::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ObjectType::from_tag(0), None);
        assert!(ObjectType::MemDc.is_dc());
        assert!(!ObjectType::Pen.is_dc());
    }
}
