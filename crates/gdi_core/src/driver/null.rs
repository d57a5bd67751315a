//! Terminal layer of every chain

use super::caps::{DeviceCap, DeviceCaps};
use super::gamma::GammaRamp;
use super::layer::{DeviceLayer, Next};
use super::TextMetrics;
use crate::foundation::color::ColorRef;
use crate::foundation::math::{Point, Rect, Size};
use crate::handle::Handle;
use crate::object::{Bitmap, LogBrush, LogFont, LogPen};

/// Layer that accepts every operation without touching any pixels
///
/// Attribute changes are accepted as requested, selections succeed, drawing
/// reports success with nothing drawn, and queries that need a real device
/// report no data. Capability queries are answered from [`DeviceCaps`].
#[derive(Debug, Clone, Default)]
pub struct NullLayer {
    caps: DeviceCaps,
}

impl NullLayer {
    /// Null layer answering capability queries from `caps`
    pub fn new(caps: DeviceCaps) -> Self {
        Self { caps }
    }

    /// Capabilities reported by this layer
    pub fn caps(&self) -> &DeviceCaps {
        &self.caps
    }
}

impl DeviceLayer for NullLayer {
    fn name(&self) -> &'static str {
        "null"
    }

    fn set_bk_color(&mut self, _next: Next<'_>, color: ColorRef) -> ColorRef {
        color
    }

    fn set_text_color(&mut self, _next: Next<'_>, color: ColorRef) -> ColorRef {
        color
    }

    fn set_dc_brush_color(&mut self, _next: Next<'_>, color: ColorRef) -> ColorRef {
        color
    }

    fn set_dc_pen_color(&mut self, _next: Next<'_>, color: ColorRef) -> ColorRef {
        color
    }

    fn set_arc_direction(&mut self, _next: Next<'_>, direction: u32) -> u32 {
        direction
    }

    fn set_layout(&mut self, _next: Next<'_>, layout: u32) -> u32 {
        layout
    }

    fn select_pen(&mut self, _next: Next<'_>, _handle: Handle, _pen: &LogPen) -> bool {
        true
    }

    fn select_brush(&mut self, _next: Next<'_>, _handle: Handle, _brush: &LogBrush) -> bool {
        true
    }

    fn select_font(&mut self, _next: Next<'_>, _handle: Handle, _font: &LogFont) -> bool {
        true
    }

    fn select_bitmap(&mut self, _next: Next<'_>, _handle: Handle, _bitmap: &Bitmap) -> bool {
        true
    }

    fn select_palette(&mut self, _next: Next<'_>, _handle: Handle, _background: bool) -> bool {
        true
    }

    fn realize_default_palette(&mut self, _next: Next<'_>) -> u32 {
        0
    }

    fn delete_object(&mut self, _next: Next<'_>, _handle: Handle) -> bool {
        true
    }

    fn save_dc(&mut self, _next: Next<'_>, _level: i32) -> bool {
        true
    }

    fn restore_dc(&mut self, _next: Next<'_>, _level: i32) -> bool {
        true
    }

    fn line_to(&mut self, _next: Next<'_>, _from: Point, _to: Point) -> bool {
        true
    }

    fn rectangle(&mut self, _next: Next<'_>, _rect: Rect) -> bool {
        true
    }

    fn ellipse(&mut self, _next: Next<'_>, _rect: Rect) -> bool {
        true
    }

    fn polyline(&mut self, _next: Next<'_>, _points: &[Point]) -> bool {
        true
    }

    fn pat_blt(&mut self, _next: Next<'_>, _rect: Rect, _rop: u32) -> bool {
        true
    }

    fn set_pixel(&mut self, _next: Next<'_>, _point: Point, _color: ColorRef) -> ColorRef {
        ColorRef::INVALID
    }

    fn get_pixel(&mut self, _next: Next<'_>, _point: Point) -> ColorRef {
        ColorRef::INVALID
    }

    fn ext_text_out(&mut self, _next: Next<'_>, _origin: Point, _text: &str, _clip: Option<Rect>) -> bool {
        true
    }

    fn get_text_metrics(&mut self, _next: Next<'_>) -> Option<TextMetrics> {
        None
    }

    fn get_text_extent(&mut self, _next: Next<'_>, _text: &str) -> Option<Size> {
        None
    }

    fn get_image(&mut self, _next: Next<'_>, _rect: Rect) -> Option<Vec<ColorRef>> {
        None
    }

    fn get_device_caps(&mut self, _next: Next<'_>, cap: DeviceCap) -> i32 {
        self.caps.query(cap)
    }

    fn get_device_gamma_ramp(&mut self, _next: Next<'_>) -> Option<GammaRamp> {
        None
    }

    fn set_device_gamma_ramp(&mut self, _next: Next<'_>, _ramp: &GammaRamp) -> bool {
        false
    }
}
