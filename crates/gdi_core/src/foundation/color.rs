//! Packed RGB color references

use std::fmt;

/// A `0x00BBGGRR` packed color value
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ColorRef(pub u32);

unsafe impl bytemuck::Pod for ColorRef {}
unsafe impl bytemuck::Zeroable for ColorRef {}

impl ColorRef {
    /// Returned by setters that fail
    pub const INVALID: Self = Self(0xFFFF_FFFF);
    /// Opaque black
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Pack red, green and blue components
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self((r as u32) | ((g as u32) << 8) | ((b as u32) << 16))
    }

    /// Red component
    pub const fn red(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Green component
    pub const fn green(self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    /// Blue component
    pub const fn blue(self) -> u8 {
        ((self.0 >> 16) & 0xFF) as u8
    }
}

impl fmt::Debug for ColorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColorRef({:#08x})", self.0)
    }
}
