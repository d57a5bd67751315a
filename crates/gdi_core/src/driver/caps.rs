//! Device capability codes and the default answers

use crate::config::DEFAULT_DPI;
use crate::foundation::math::mul_div;

/// Capability codes, numbered like `GetDeviceCaps`
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceCap {
    /// Driver version
    DriverVersion = 0,
    /// Device technology
    Technology = 2,
    /// Physical width in millimetres
    HorzSize = 4,
    /// Physical height in millimetres
    VertSize = 6,
    /// Width in pixels
    HorzRes = 8,
    /// Height in pixels
    VertRes = 10,
    /// Bits per pixel
    BitsPixel = 12,
    /// Color planes
    Planes = 14,
    /// Device brushes
    NumBrushes = 16,
    /// Device pens
    NumPens = 18,
    /// Device markers
    NumMarkers = 20,
    /// Device fonts
    NumFonts = 22,
    /// Entries in the color table
    NumColors = 24,
    /// Curve capabilities
    CurveCaps = 28,
    /// Line capabilities
    LineCaps = 30,
    /// Polygon capabilities
    PolygonalCaps = 32,
    /// Text capabilities
    TextCaps = 34,
    /// Clipping capabilities
    ClipCaps = 36,
    /// Raster capabilities
    RasterCaps = 38,
    /// Relative pixel width
    AspectX = 40,
    /// Relative pixel height
    AspectY = 42,
    /// Diagonal pixel size
    AspectXY = 44,
    /// Horizontal pixels per logical inch
    LogPixelsX = 88,
    /// Vertical pixels per logical inch
    LogPixelsY = 90,
    /// Entries in the system palette
    SizePalette = 104,
    /// Reserved system palette entries
    NumReserved = 106,
    /// Actual color resolution
    ColorRes = 108,
    /// Refresh rate in hertz
    VRefresh = 116,
    /// Desktop height in pixels
    DesktopVertRes = 117,
    /// Desktop width in pixels
    DesktopHorzRes = 118,
}

impl DeviceCap {
    /// Every capability code
    pub const ALL: [Self; 30] = [
        Self::DriverVersion,
        Self::Technology,
        Self::HorzSize,
        Self::VertSize,
        Self::HorzRes,
        Self::VertRes,
        Self::BitsPixel,
        Self::Planes,
        Self::NumBrushes,
        Self::NumPens,
        Self::NumMarkers,
        Self::NumFonts,
        Self::NumColors,
        Self::CurveCaps,
        Self::LineCaps,
        Self::PolygonalCaps,
        Self::TextCaps,
        Self::ClipCaps,
        Self::RasterCaps,
        Self::AspectX,
        Self::AspectY,
        Self::AspectXY,
        Self::LogPixelsX,
        Self::LogPixelsY,
        Self::SizePalette,
        Self::NumReserved,
        Self::ColorRes,
        Self::VRefresh,
        Self::DesktopVertRes,
        Self::DesktopHorzRes,
    ];

    /// Numeric code
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Parse a numeric code
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|cap| cap.code() == code)
    }
}

const DT_RASDISPLAY: i32 = 1;
const CURVE_CAPS: i32 = 0x00FF;
const LINE_CAPS: i32 = 0x00FE;
const POLYGONAL_CAPS: i32 = 0x00FF;
const TEXT_CAPS: i32 = 0x1000 | 0x0004;
const CLIP_RECT: i32 = 1;
const RASTER_CAPS: i32 = 0x0001 | 0x0008 | 0x0800 | 0x0200;

/// Geometry and depth answering the capability codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCaps {
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
    /// Bits per pixel
    pub bits_per_pixel: i32,
    /// Logical DPI
    pub dpi: i32,
    /// Physical width in millimetres, derived from DPI when `None`
    pub width_mm: Option<i32>,
    /// Physical height in millimetres, derived from DPI when `None`
    pub height_mm: Option<i32>,
}

impl Default for DeviceCaps {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            bits_per_pixel: 32,
            dpi: DEFAULT_DPI as i32,
            width_mm: None,
            height_mm: None,
        }
    }
}

impl DeviceCaps {
    /// Default geometry at the given DPI
    pub fn with_dpi(dpi: u32) -> Self {
        Self {
            dpi: i32::try_from(dpi).unwrap_or(DEFAULT_DPI as i32),
            ..Self::default()
        }
    }

    /// Answer a capability query
    pub fn query(&self, cap: DeviceCap) -> i32 {
        match cap {
            DeviceCap::DriverVersion => 0x4000,
            DeviceCap::Technology => DT_RASDISPLAY,
            DeviceCap::HorzSize => self.width_mm.unwrap_or_else(|| mul_div(self.width, 254, self.dpi * 10)),
            DeviceCap::VertSize => self.height_mm.unwrap_or_else(|| mul_div(self.height, 254, self.dpi * 10)),
            DeviceCap::HorzRes | DeviceCap::DesktopHorzRes => self.width,
            DeviceCap::VertRes | DeviceCap::DesktopVertRes => self.height,
            DeviceCap::BitsPixel => self.bits_per_pixel,
            DeviceCap::Planes => 1,
            DeviceCap::NumBrushes | DeviceCap::NumPens => -1,
            DeviceCap::NumMarkers | DeviceCap::NumFonts => 0,
            DeviceCap::NumColors => {
                if self.bits_per_pixel > 8 {
                    -1
                } else {
                    1 << self.bits_per_pixel
                }
            }
            DeviceCap::CurveCaps => CURVE_CAPS,
            DeviceCap::LineCaps => LINE_CAPS,
            DeviceCap::PolygonalCaps => POLYGONAL_CAPS,
            DeviceCap::TextCaps => TEXT_CAPS,
            DeviceCap::ClipCaps => CLIP_RECT,
            DeviceCap::RasterCaps => RASTER_CAPS,
            DeviceCap::AspectX | DeviceCap::AspectY => 36,
            DeviceCap::AspectXY => 51,
            DeviceCap::LogPixelsX | DeviceCap::LogPixelsY => self.dpi,
            DeviceCap::SizePalette => 0,
            DeviceCap::NumReserved => 20,
            DeviceCap::ColorRes => 0,
            DeviceCap::VRefresh => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        let caps = DeviceCaps::default();
        assert_eq!(caps.query(DeviceCap::HorzRes), 640);
        assert_eq!(caps.query(DeviceCap::VertRes), 480);
        assert_eq!(caps.query(DeviceCap::Planes), 1);
        assert_eq!(caps.query(DeviceCap::LogPixelsY), 96);
        // 640 px at 96 dpi is 169.33 mm
        assert_eq!(caps.query(DeviceCap::HorzSize), 169);
        assert_eq!(caps.query(DeviceCap::NumColors), -1);
    }

    #[test]
    fn test_explicit_size_and_palette_depth() {
        let caps = DeviceCaps {
            bits_per_pixel: 8,
            width_mm: Some(300),
            ..DeviceCaps::with_dpi(120)
        };
        assert_eq!(caps.query(DeviceCap::HorzSize), 300);
        assert_eq!(caps.query(DeviceCap::NumColors), 256);
        assert_eq!(caps.query(DeviceCap::LogPixelsX), 120);
    }

    #[test]
    fn test_codes_round_trip() {
        for cap in DeviceCap::ALL {
            assert_eq!(DeviceCap::from_code(cap.code()), Some(cap));
        }
        assert_eq!(DeviceCap::from_code(1), None);
    }
}
