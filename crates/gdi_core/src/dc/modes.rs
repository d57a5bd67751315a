//! Device context mode values
//!
//! The attribute block stores these as raw numbers; the typed forms here are
//! what the service API accepts and returns.

use bitflags::bitflags;

/// Logical-to-device mapping mode
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMode {
    /// One logical unit is one pixel, y grows down
    Text = 1,
    /// 0.1 mm, y grows up
    LoMetric = 2,
    /// 0.01 mm, y grows up
    HiMetric = 3,
    /// 0.01 inch, y grows up
    LoEnglish = 4,
    /// 0.001 inch, y grows up
    HiEnglish = 5,
    /// 1/1440 inch, y grows up
    Twips = 6,
    /// Caller-defined units with equal axis scaling
    Isotropic = 7,
    /// Caller-defined units on each axis
    Anisotropic = 8,
}

impl MapMode {
    /// Parse a raw `MM_*` value
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Self::Text),
            2 => Some(Self::LoMetric),
            3 => Some(Self::HiMetric),
            4 => Some(Self::LoEnglish),
            5 => Some(Self::HiEnglish),
            6 => Some(Self::Twips),
            7 => Some(Self::Isotropic),
            8 => Some(Self::Anisotropic),
            _ => None,
        }
    }

    /// Whether the window and viewport extents are fixed by the mode
    pub const fn has_fixed_extents(self) -> bool {
        !matches!(self, Self::Isotropic | Self::Anisotropic)
    }
}

/// How text and hatch backgrounds are filled
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundMode {
    /// Background left untouched
    Transparent = 1,
    /// Background filled with the background color
    Opaque = 2,
}

impl BackgroundMode {
    /// Parse a raw value
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Self::Transparent),
            2 => Some(Self::Opaque),
            _ => None,
        }
    }
}

/// Polygon interior rule
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolyFillMode {
    /// Even-odd rule
    Alternate = 1,
    /// Non-zero winding rule
    Winding = 2,
}

impl PolyFillMode {
    /// Parse a raw value
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Self::Alternate),
            2 => Some(Self::Winding),
            _ => None,
        }
    }
}

/// Pixel combination when shrinking bitmaps
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StretchMode {
    /// AND eliminated pixels
    BlackOnWhite = 1,
    /// OR eliminated pixels
    WhiteOnBlack = 2,
    /// Drop eliminated pixels
    ColorOnColor = 3,
    /// Average source blocks
    Halftone = 4,
}

impl StretchMode {
    /// Parse a raw value
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Self::BlackOnWhite),
            2 => Some(Self::WhiteOnBlack),
            3 => Some(Self::ColorOnColor),
            4 => Some(Self::Halftone),
            _ => None,
        }
    }
}

/// Whether line coordinates are absolute or relative to the current position
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelAbsMode {
    /// Absolute coordinates
    Absolute = 1,
    /// Relative coordinates
    Relative = 2,
}

impl RelAbsMode {
    /// Parse a raw value
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Self::Absolute),
            2 => Some(Self::Relative),
            _ => None,
        }
    }
}

/// Whether world transforms are honored
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicsMode {
    /// World transform ignored for text
    Compatible = 1,
    /// World transform fully applied
    Advanced = 2,
}

impl GraphicsMode {
    /// Parse a raw value
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Self::Compatible),
            2 => Some(Self::Advanced),
            _ => None,
        }
    }
}

/// Drawing direction of arcs and ellipses
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcDirection {
    /// Counter-clockwise
    CounterClockwise = 1,
    /// Clockwise
    Clockwise = 2,
}

impl ArcDirection {
    /// Parse a raw value; anything else is rejected by the setter
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Self::CounterClockwise),
            2 => Some(Self::Clockwise),
            _ => None,
        }
    }
}

/// Binary raster operation, `R2_BLACK` (1) through `R2_WHITE` (16)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rop2(u32);

impl Rop2 {
    /// Destination becomes black
    pub const BLACK: Self = Self(1);
    /// Destination becomes the inverse
    pub const NOT: Self = Self(6);
    /// Destination XOR pen
    pub const XOR_PEN: Self = Self(7);
    /// Destination left unchanged
    pub const NOP: Self = Self(11);
    /// Destination becomes the pen color
    pub const COPY_PEN: Self = Self(13);
    /// Destination becomes white
    pub const WHITE: Self = Self(16);

    /// Validate a raw value
    pub const fn from_raw(raw: u32) -> Option<Self> {
        if raw >= 1 && raw <= 16 {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Raw value
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Operation applied by `modify_world_transform`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldModify {
    /// Reset to identity
    Identity,
    /// Apply the given transform before the current one
    LeftMultiply,
    /// Apply the given transform after the current one
    RightMultiply,
}

/// Selector for `get_transform`, numbered like the undocumented codes
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    /// World to page (the world transform)
    WorldToPage = 0x203,
    /// Page to device (the mapping mode transform)
    PageToDevice = 0x304,
    /// World to device
    WorldToDevice = 0x204,
    /// Device to world
    DeviceToWorld = 0x402,
}

impl TransformKind {
    /// Parse a numeric selector
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0x203 => Some(Self::WorldToPage),
            0x304 => Some(Self::PageToDevice),
            0x204 => Some(Self::WorldToDevice),
            0x402 => Some(Self::DeviceToWorld),
            _ => None,
        }
    }
}

bitflags! {
    /// Text alignment; the empty set is left, top, no update
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextAlign: u32 {
        /// Update the current position after output
        const UPDATE_CP = 0x0001;
        /// Right aligned
        const RIGHT = 0x0002;
        /// Horizontally centered
        const CENTER = 0x0006;
        /// Bottom aligned
        const BOTTOM = 0x0008;
        /// Baseline aligned
        const BASELINE = 0x0018;
        /// Right-to-left reading order
        const RTL_READING = 0x0100;
    }
}

bitflags! {
    /// Drawing layout flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Layout: u32 {
        /// Right-to-left: the x axis is mirrored across the visible area
        const RTL = 0x0001;
        /// Bitmaps keep their orientation under RTL
        const BITMAP_ORIENTATION_PRESERVED = 0x0008;
    }
}

bitflags! {
    /// `set_bounds_rect` / `get_bounds_rect` control flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BoundsFlags: u32 {
        /// Clear the accumulated rectangle
        const RESET = 0x0001;
        /// Merge the given rectangle
        const ACCUMULATE = 0x0002;
        /// Start accumulating
        const ENABLE = 0x0004;
        /// Stop accumulating
        const DISABLE = 0x0008;
    }
}

/// Returned by `get_bounds_rect` and `set_bounds_rect`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundsState {
    /// Something has been accumulated since the last reset
    pub dirty: bool,
    /// Accumulation is enabled
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_values_parse() {
        assert_eq!(MapMode::from_raw(MapMode::Twips as u32), Some(MapMode::Twips));
        assert_eq!(MapMode::from_raw(0), None);
        assert!(MapMode::LoMetric.has_fixed_extents());
        assert!(!MapMode::Isotropic.has_fixed_extents());
        assert_eq!(ArcDirection::from_raw(3), None);
        assert_eq!(Rop2::from_raw(13), Some(Rop2::COPY_PEN));
        assert_eq!(Rop2::from_raw(17), None);
        assert_eq!(TransformKind::from_code(0x402), Some(TransformKind::DeviceToWorld));
    }

    #[test]
    fn test_flag_sets() {
        let align = TextAlign::BASELINE | TextAlign::UPDATE_CP;
        assert_eq!(align.bits(), 0x19);
        assert!(TextAlign::from_bits(0x8000).is_none());
        assert_eq!(Layout::from_bits_truncate(0x9), Layout::RTL | Layout::BITMAP_ORIENTATION_PRESERVED);
    }
}
