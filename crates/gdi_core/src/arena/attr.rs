//! Flat device context attribute record

use crate::foundation::color::ColorRef;
use crate::foundation::math::{Point, Size};

/// Layout revision stored in every block's `version` field
pub const DC_ATTR_VERSION: u32 = 1;

/// Per-level device context attributes
///
/// Every field is four bytes wide and four-byte aligned, so the record has no
/// padding and its byte image is fully defined. Out-of-process readers index
/// into a region snapshot by the offsets below; fields may only be appended,
/// and appending requires bumping [`DC_ATTR_VERSION`].
///
/// | offset | field |
/// |-------:|-------|
/// | 0 | `version` |
/// | 4 | `hdc` |
/// | 8 | `save_level` |
/// | 12 | `layout` |
/// | 16 | `map_mode` |
/// | 20 | `graphics_mode` |
/// | 24 | `window_org` |
/// | 32 | `window_ext` |
/// | 40 | `viewport_org` |
/// | 48 | `viewport_ext` |
/// | 56 | `background_color` |
/// | 60 | `text_color` |
/// | 64 | `brush_color` |
/// | 68 | `pen_color` |
/// | 72 | `text_align` |
/// | 76 | `background_mode` |
/// | 80 | `rop2` |
/// | 84 | `poly_fill_mode` |
/// | 88 | `stretch_blt_mode` |
/// | 92 | `rel_abs_mode` |
/// | 96 | `arc_direction` |
/// | 100 | `cur_pos` |
/// | 108 | `brush_org` |
/// | 116 | `miter_limit` |
/// | 120 | `char_extra` |
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DcAttr {
    /// Layout revision, [`DC_ATTR_VERSION`] once initialized
    pub version: u32,
    /// Raw handle of the owning context
    pub hdc: u32,
    /// Save level this block belongs to
    pub save_level: i32,
    /// `LAYOUT_*` flags
    pub layout: u32,
    /// `MM_*` mapping mode
    pub map_mode: u32,
    /// `GM_*` graphics mode
    pub graphics_mode: u32,
    /// Window origin
    pub window_org: Point,
    /// Window extent
    pub window_ext: Size,
    /// Viewport origin
    pub viewport_org: Point,
    /// Viewport extent
    pub viewport_ext: Size,
    /// Background color
    pub background_color: ColorRef,
    /// Text color
    pub text_color: ColorRef,
    /// Color of the DC brush stock object
    pub brush_color: ColorRef,
    /// Color of the DC pen stock object
    pub pen_color: ColorRef,
    /// `TA_*` flags
    pub text_align: u32,
    /// `TRANSPARENT` or `OPAQUE`
    pub background_mode: u32,
    /// Binary raster operation
    pub rop2: u32,
    /// `ALTERNATE` or `WINDING`
    pub poly_fill_mode: u32,
    /// `STRETCH_*` mode
    pub stretch_blt_mode: u32,
    /// `ABSOLUTE` or `RELATIVE`
    pub rel_abs_mode: u32,
    /// `AD_*` arc direction
    pub arc_direction: u32,
    /// Current pen position in logical units
    pub cur_pos: Point,
    /// Brush origin in device units
    pub brush_org: Point,
    /// Miter length limit
    pub miter_limit: f32,
    /// Extra inter-character spacing
    pub char_extra: i32,
}

unsafe impl bytemuck::Pod for DcAttr {}
unsafe impl bytemuck::Zeroable for DcAttr {}

impl DcAttr {
    /// Decode a block from an external byte image
    ///
    /// Returns `None` if `bytes` is shorter than one block.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let size = std::mem::size_of::<Self>();
        (bytes.len() >= size).then(|| bytemuck::pod_read_unaligned(&bytes[..size]))
    }

    /// Byte image of this block
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
