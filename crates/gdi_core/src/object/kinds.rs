//! Logical descriptions of the drawable resource kinds

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::foundation::color::ColorRef;
use crate::foundation::math::{Point, Rect};

/// Pen line style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenStyle {
    /// Solid line
    Solid,
    /// Dashed line
    Dash,
    /// Dotted line
    Dot,
    /// Alternating dashes and dots
    DashDot,
    /// Nothing is drawn
    Null,
    /// Solid line drawn inside the shape's bounding box
    InsideFrame,
}

/// Logical pen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogPen {
    /// Line style
    pub style: PenStyle,
    /// Width in logical units; zero means one device pixel
    pub width: i32,
    /// Line color
    pub color: ColorRef,
}

impl LogPen {
    /// Create a pen description
    pub const fn new(style: PenStyle, width: i32, color: ColorRef) -> Self {
        Self { style, width, color }
    }
}

/// Brush hatch pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HatchStyle {
    /// `-----`
    Horizontal,
    /// `|||||`
    Vertical,
    /// `\\\\\`
    ForwardDiagonal,
    /// `/////`
    BackwardDiagonal,
    /// `+++++`
    Cross,
    /// `xxxxx`
    DiagonalCross,
}

/// Brush fill style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushStyle {
    /// Solid color
    Solid,
    /// Nothing is painted
    Null,
    /// Hatched pattern over the background
    Hatched(HatchStyle),
}

/// Logical brush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogBrush {
    /// Fill style
    pub style: BrushStyle,
    /// Fill color
    pub color: ColorRef,
}

impl LogBrush {
    /// Solid brush of the given color
    pub const fn solid(color: ColorRef) -> Self {
        Self {
            style: BrushStyle::Solid,
            color,
        }
    }
}

/// Logical font request; glyph rendering is handled elsewhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFont {
    /// Character cell or glyph height in logical units
    pub height: i32,
    /// Average character width, zero to derive from the height
    pub width: i32,
    /// Angle of the baseline in tenths of a degree
    pub escapement: i32,
    /// Weight, 400 normal and 700 bold
    pub weight: i32,
    /// Italic
    pub italic: bool,
    /// Underlined
    pub underline: bool,
    /// Struck out
    pub strike_out: bool,
    /// Character set
    pub charset: u8,
    /// Fixed pitch requested
    pub fixed_pitch: bool,
    /// Typeface name
    pub face_name: String,
}

impl LogFont {
    /// Normal-weight font of the given face and height
    pub fn new(face_name: impl Into<String>, height: i32) -> Self {
        Self {
            height,
            width: 0,
            escapement: 0,
            weight: 400,
            italic: false,
            underline: false,
            strike_out: false,
            charset: 0,
            fixed_pitch: false,
            face_name: face_name.into(),
        }
    }

    /// Set the weight
    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    /// Request a fixed-pitch face
    pub fn with_fixed_pitch(mut self) -> Self {
        self.fixed_pitch = true;
        self
    }
}

impl Default for LogFont {
    fn default() -> Self {
        Self::new("System", 16).with_weight(700)
    }
}

/// Pixel storage of a bitmap, shared with the layers that draw into it
#[derive(Debug, Clone)]
pub struct Bitmap {
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
    /// Color depth
    pub bits_per_pixel: i32,
    bits: Arc<Mutex<Vec<ColorRef>>>,
}

impl Bitmap {
    /// Allocate a zero-filled bitmap
    pub fn new(width: i32, height: i32, bits_per_pixel: i32) -> Self {
        let count = usize::try_from(width).unwrap_or(0) * usize::try_from(height).unwrap_or(0);
        Self {
            width,
            height,
            bits_per_pixel,
            bits: Arc::new(Mutex::new(vec![ColorRef::BLACK; count])),
        }
    }

    /// Bounds of the pixel grid
    pub fn rect(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Lock the pixel storage
    pub fn pixels(&self) -> MutexGuard<'_, Vec<ColorRef>> {
        self.bits.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Row-major index of `point`, `None` outside the grid
    pub fn offset(&self, point: Point) -> Option<usize> {
        if !self.rect().contains(point) {
            return None;
        }
        usize::try_from(point.y * self.width + point.x).ok()
    }

    /// Whether two values share pixel storage
    pub fn same_surface(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.bits, &other.bits)
    }
}

/// One logical palette entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    /// Red
    pub red: u8,
    /// Green
    pub green: u8,
    /// Blue
    pub blue: u8,
    /// `PC_*` flags
    pub flags: u8,
}

impl PaletteEntry {
    /// Entry with no flags
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue, flags: 0 }
    }
}

/// Logical palette
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    /// Entries in index order
    pub entries: Vec<PaletteEntry>,
}

impl Palette {
    /// The twenty static system colors
    pub fn system_default() -> Self {
        const SYSTEM: [(u8, u8, u8); 20] = [
            (0x00, 0x00, 0x00), (0x80, 0x00, 0x00), (0x00, 0x80, 0x00), (0x80, 0x80, 0x00),
            (0x00, 0x00, 0x80), (0x80, 0x00, 0x80), (0x00, 0x80, 0x80), (0xc0, 0xc0, 0xc0),
            (0xc0, 0xdc, 0xc0), (0xa6, 0xca, 0xf0), (0xff, 0xfb, 0xf0), (0xa0, 0xa0, 0xa4),
            (0x80, 0x80, 0x80), (0xff, 0x00, 0x00), (0x00, 0xff, 0x00), (0xff, 0xff, 0x00),
            (0x00, 0x00, 0xff), (0xff, 0x00, 0xff), (0x00, 0xff, 0xff), (0xff, 0xff, 0xff),
        ];
        Self {
            entries: SYSTEM.iter().map(|&(r, g, b)| PaletteEntry::rgb(r, g, b)).collect(),
        }
    }
}

/// Region as a list of non-rasterized rectangles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    /// Region with no area
    pub fn empty() -> Self {
        Self::default()
    }

    /// Region covering a single rectangle
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.normalized();
        Self {
            rects: if rect.is_empty() { Vec::new() } else { vec![rect] },
        }
    }

    /// Component rectangles
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Whether the region has no area
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Bounding box, [`Rect::default`] when empty
    pub fn bounding_box(&self) -> Rect {
        if self.rects.is_empty() {
            return Rect::default();
        }
        self.rects.iter().fold(Rect::EMPTY, |acc, r| acc.union(r))
    }

    /// Clip every component to `rect`
    pub fn intersect_rect(&self, rect: &Rect) -> Self {
        Self {
            rects: self.rects.iter().filter_map(|r| r.intersect(rect)).collect(),
        }
    }

    /// Pairwise intersection with another region
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            rects: self
                .rects
                .iter()
                .flat_map(|a| other.rects.iter().filter_map(move |b| a.intersect(b)))
                .collect(),
        }
    }

    /// Translate every component
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            rects: self.rects.iter().map(|r| r.offset(dx, dy)).collect(),
        }
    }

    /// Whether any component contains `point`
    pub fn contains(&self, point: Point) -> bool {
        self.rects.iter().any(|r| r.contains(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_clipping() {
        let region = Region::from_rect(Rect::new(0, 0, 100, 100));
        let clipped = region.intersect_rect(&Rect::new(50, 50, 200, 200));
        assert_eq!(clipped.rects(), &[Rect::new(50, 50, 100, 100)]);
        assert!(clipped.contains(Point::new(60, 60)));
        assert!(!clipped.contains(Point::new(10, 10)));
        assert!(region.intersect_rect(&Rect::new(200, 200, 300, 300)).is_empty());
    }

    #[test]
    fn test_region_bounding_box() {
        let a = Region::from_rect(Rect::new(0, 0, 10, 10));
        let b = Region::from_rect(Rect::new(-5, -5, 5, 5)).offset(20, 20);
        let both = Region {
            rects: [a.rects(), b.rects()].concat(),
        };
        assert_eq!(both.bounding_box(), Rect::new(0, 0, 25, 25));
        assert_eq!(Region::empty().bounding_box(), Rect::default());
    }

    #[test]
    fn test_bitmap_offsets() {
        let bitmap = Bitmap::new(4, 3, 32);
        assert_eq!(bitmap.pixels().len(), 12);
        assert_eq!(bitmap.offset(Point::new(1, 2)), Some(9));
        assert_eq!(bitmap.offset(Point::new(4, 0)), None);
        assert!(bitmap.same_surface(&bitmap.clone()));
        assert!(!bitmap.same_surface(&Bitmap::new(4, 3, 32)));
    }

    #[test]
    fn test_default_palette() {
        let palette = Palette::system_default();
        assert_eq!(palette.entries.len(), 20);
        assert_eq!(palette.entries[19], PaletteEntry::rgb(0xff, 0xff, 0xff));
    }
}
