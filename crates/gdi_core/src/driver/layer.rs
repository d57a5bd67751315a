//! The device layer operation catalog

use super::caps::DeviceCap;
use super::gamma::GammaRamp;
use super::null::NullLayer;
use super::TextMetrics;
use crate::foundation::color::ColorRef;
use crate::foundation::math::{Point, Rect, Size};
use crate::handle::Handle;
use crate::object::{Bitmap, LogBrush, LogFont, LogPen};

/// One capability layer in a device context's dispatch chain
///
/// Every operation receives a [`Next`] cursor positioned at the layer below.
/// The provided implementations forward to it unchanged, so a layer only
/// overrides what it actually handles. Coordinates are device units.
pub trait DeviceLayer: Send {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// Called once when the layer is removed from its chain
    fn delete_dc(&mut self) {}

    // --- attribute notifications, returning the value to store or `ColorRef::INVALID` to refuse

    /// Background color changed
    fn set_bk_color(&mut self, next: Next<'_>, color: ColorRef) -> ColorRef {
        next.set_bk_color(color)
    }

    /// Text color changed
    fn set_text_color(&mut self, next: Next<'_>, color: ColorRef) -> ColorRef {
        next.set_text_color(color)
    }

    /// DC brush color changed
    fn set_dc_brush_color(&mut self, next: Next<'_>, color: ColorRef) -> ColorRef {
        next.set_dc_brush_color(color)
    }

    /// DC pen color changed
    fn set_dc_pen_color(&mut self, next: Next<'_>, color: ColorRef) -> ColorRef {
        next.set_dc_pen_color(color)
    }

    /// Arc direction changed; zero refuses
    fn set_arc_direction(&mut self, next: Next<'_>, direction: u32) -> u32 {
        next.set_arc_direction(direction)
    }

    /// Layout changed; `u32::MAX` refuses
    fn set_layout(&mut self, next: Next<'_>, layout: u32) -> u32 {
        next.set_layout(layout)
    }

    // --- object selection

    /// Pen selected or reselected
    fn select_pen(&mut self, next: Next<'_>, handle: Handle, pen: &LogPen) -> bool {
        next.select_pen(handle, pen)
    }

    /// Brush selected or reselected
    fn select_brush(&mut self, next: Next<'_>, handle: Handle, brush: &LogBrush) -> bool {
        next.select_brush(handle, brush)
    }

    /// Font selected or reselected
    fn select_font(&mut self, next: Next<'_>, handle: Handle, font: &LogFont) -> bool {
        next.select_font(handle, font)
    }

    /// Bitmap selected into a memory context
    fn select_bitmap(&mut self, next: Next<'_>, handle: Handle, bitmap: &Bitmap) -> bool {
        next.select_bitmap(handle, bitmap)
    }

    /// Palette selected
    fn select_palette(&mut self, next: Next<'_>, handle: Handle, background: bool) -> bool {
        next.select_palette(handle, background)
    }

    /// Realize the default palette; returns the entries mapped
    fn realize_default_palette(&mut self, next: Next<'_>) -> u32 {
        next.realize_default_palette()
    }

    /// An object this context used is being destroyed
    fn delete_object(&mut self, next: Next<'_>, handle: Handle) -> bool {
        next.delete_object(handle)
    }

    // --- state

    /// State pushed; `level` is the new save level
    fn save_dc(&mut self, next: Next<'_>, level: i32) -> bool {
        next.save_dc(level)
    }

    /// State popped back to `level`
    fn restore_dc(&mut self, next: Next<'_>, level: i32) -> bool {
        next.restore_dc(level)
    }

    // --- drawing

    /// Straight line with the current pen
    fn line_to(&mut self, next: Next<'_>, from: Point, to: Point) -> bool {
        next.line_to(from, to)
    }

    /// Outlined and filled rectangle
    fn rectangle(&mut self, next: Next<'_>, rect: Rect) -> bool {
        next.rectangle(rect)
    }

    /// Outlined and filled ellipse
    fn ellipse(&mut self, next: Next<'_>, rect: Rect) -> bool {
        next.ellipse(rect)
    }

    /// Connected line segments
    fn polyline(&mut self, next: Next<'_>, points: &[Point]) -> bool {
        next.polyline(points)
    }

    /// Pattern fill with a raster operation
    fn pat_blt(&mut self, next: Next<'_>, rect: Rect, rop: u32) -> bool {
        next.pat_blt(rect, rop)
    }

    /// Set one pixel; returns the color used or `ColorRef::INVALID`
    fn set_pixel(&mut self, next: Next<'_>, point: Point, color: ColorRef) -> ColorRef {
        next.set_pixel(point, color)
    }

    /// Read one pixel, `ColorRef::INVALID` when unavailable
    fn get_pixel(&mut self, next: Next<'_>, point: Point) -> ColorRef {
        next.get_pixel(point)
    }

    /// Draw a string
    fn ext_text_out(&mut self, next: Next<'_>, origin: Point, text: &str, clip: Option<Rect>) -> bool {
        next.ext_text_out(origin, text, clip)
    }

    // --- queries

    /// Metrics of the selected font
    fn get_text_metrics(&mut self, next: Next<'_>) -> Option<TextMetrics> {
        next.get_text_metrics()
    }

    /// Extent of a string in the selected font
    fn get_text_extent(&mut self, next: Next<'_>, text: &str) -> Option<Size> {
        next.get_text_extent(text)
    }

    /// Copy pixels out of the device, row-major
    fn get_image(&mut self, next: Next<'_>, rect: Rect) -> Option<Vec<ColorRef>> {
        next.get_image(rect)
    }

    /// Capability query
    fn get_device_caps(&mut self, next: Next<'_>, cap: DeviceCap) -> i32 {
        next.get_device_caps(cap)
    }

    /// Current gamma ramp
    fn get_device_gamma_ramp(&mut self, next: Next<'_>) -> Option<GammaRamp> {
        next.get_device_gamma_ramp()
    }

    /// Install a gamma ramp that already passed plausibility checks
    fn set_device_gamma_ramp(&mut self, next: Next<'_>, ramp: &GammaRamp) -> bool {
        next.set_device_gamma_ramp(ramp)
    }
}

/// Cursor over the layers below the one currently executing
///
/// Consumed by each forwarded call. When no layer remains the call lands on
/// a fresh [`NullLayer`], so forwarding never dead-ends.
pub struct Next<'a> {
    layers: &'a mut [Box<dyn DeviceLayer>],
}

impl<'a> Next<'a> {
    /// Cursor starting at the first of `layers`
    pub fn new(layers: &'a mut [Box<dyn DeviceLayer>]) -> Self {
        Self { layers }
    }

    /// Cursor with nothing below
    pub fn end() -> Self {
        Self {
            layers: Default::default(),
        }
    }

    /// Layers remaining below
    pub fn remaining(&self) -> usize {
        self.layers.len()
    }

    fn call<R>(self, op: impl FnOnce(&mut dyn DeviceLayer, Next<'a>) -> R) -> R {
        match self.layers.split_first_mut() {
            Some((layer, rest)) => op(layer.as_mut(), Next { layers: rest }),
            None => op(&mut NullLayer::default(), Next::end()),
        }
    }

    /// Forward [`DeviceLayer::set_bk_color`]
    pub fn set_bk_color(self, color: ColorRef) -> ColorRef {
        self.call(|layer, next| layer.set_bk_color(next, color))
    }

    /// Forward [`DeviceLayer::set_text_color`]
    pub fn set_text_color(self, color: ColorRef) -> ColorRef {
        self.call(|layer, next| layer.set_text_color(next, color))
    }

    /// Forward [`DeviceLayer::set_dc_brush_color`]
    pub fn set_dc_brush_color(self, color: ColorRef) -> ColorRef {
        self.call(|layer, next| layer.set_dc_brush_color(next, color))
    }

    /// Forward [`DeviceLayer::set_dc_pen_color`]
    pub fn set_dc_pen_color(self, color: ColorRef) -> ColorRef {
        self.call(|layer, next| layer.set_dc_pen_color(next, color))
    }

    /// Forward [`DeviceLayer::set_arc_direction`]
    pub fn set_arc_direction(self, direction: u32) -> u32 {
        self.call(|layer, next| layer.set_arc_direction(next, direction))
    }

    /// Forward [`DeviceLayer::set_layout`]
    pub fn set_layout(self, layout: u32) -> u32 {
        self.call(|layer, next| layer.set_layout(next, layout))
    }

    /// Forward [`DeviceLayer::select_pen`]
    pub fn select_pen(self, handle: Handle, pen: &LogPen) -> bool {
        self.call(|layer, next| layer.select_pen(next, handle, pen))
    }

    /// Forward [`DeviceLayer::select_brush`]
    pub fn select_brush(self, handle: Handle, brush: &LogBrush) -> bool {
        self.call(|layer, next| layer.select_brush(next, handle, brush))
    }

    /// Forward [`DeviceLayer::select_font`]
    pub fn select_font(self, handle: Handle, font: &LogFont) -> bool {
        self.call(|layer, next| layer.select_font(next, handle, font))
    }

    /// Forward [`DeviceLayer::select_bitmap`]
    pub fn select_bitmap(self, handle: Handle, bitmap: &Bitmap) -> bool {
        self.call(|layer, next| layer.select_bitmap(next, handle, bitmap))
    }

    /// Forward [`DeviceLayer::select_palette`]
    pub fn select_palette(self, handle: Handle, background: bool) -> bool {
        self.call(|layer, next| layer.select_palette(next, handle, background))
    }

    /// Forward [`DeviceLayer::realize_default_palette`]
    pub fn realize_default_palette(self) -> u32 {
        self.call(|layer, next| layer.realize_default_palette(next))
    }

    /// Forward [`DeviceLayer::delete_object`]
    pub fn delete_object(self, handle: Handle) -> bool {
        self.call(|layer, next| layer.delete_object(next, handle))
    }

    /// Forward [`DeviceLayer::save_dc`]
    pub fn save_dc(self, level: i32) -> bool {
        self.call(|layer, next| layer.save_dc(next, level))
    }

    /// Forward [`DeviceLayer::restore_dc`]
    pub fn restore_dc(self, level: i32) -> bool {
        self.call(|layer, next| layer.restore_dc(next, level))
    }

    /// Forward [`DeviceLayer::line_to`]
    pub fn line_to(self, from: Point, to: Point) -> bool {
        self.call(|layer, next| layer.line_to(next, from, to))
    }

    /// Forward [`DeviceLayer::rectangle`]
    pub fn rectangle(self, rect: Rect) -> bool {
        self.call(|layer, next| layer.rectangle(next, rect))
    }

    /// Forward [`DeviceLayer::ellipse`]
    pub fn ellipse(self, rect: Rect) -> bool {
        self.call(|layer, next| layer.ellipse(next, rect))
    }

    /// Forward [`DeviceLayer::polyline`]
    pub fn polyline(self, points: &[Point]) -> bool {
        self.call(|layer, next| layer.polyline(next, points))
    }

    /// Forward [`DeviceLayer::pat_blt`]
    pub fn pat_blt(self, rect: Rect, rop: u32) -> bool {
        self.call(|layer, next| layer.pat_blt(next, rect, rop))
    }

    /// Forward [`DeviceLayer::set_pixel`]
    pub fn set_pixel(self, point: Point, color: ColorRef) -> ColorRef {
        self.call(|layer, next| layer.set_pixel(next, point, color))
    }

    /// Forward [`DeviceLayer::get_pixel`]
    pub fn get_pixel(self, point: Point) -> ColorRef {
        self.call(|layer, next| layer.get_pixel(next, point))
    }

    /// Forward [`DeviceLayer::ext_text_out`]
    pub fn ext_text_out(self, origin: Point, text: &str, clip: Option<Rect>) -> bool {
        self.call(|layer, next| layer.ext_text_out(next, origin, text, clip))
    }

    /// Forward [`DeviceLayer::get_text_metrics`]
    pub fn get_text_metrics(self) -> Option<TextMetrics> {
        self.call(|layer, next| layer.get_text_metrics(next))
    }

    /// Forward [`DeviceLayer::get_text_extent`]
    pub fn get_text_extent(self, text: &str) -> Option<Size> {
        self.call(|layer, next| layer.get_text_extent(next, text))
    }

    /// Forward [`DeviceLayer::get_image`]
    pub fn get_image(self, rect: Rect) -> Option<Vec<ColorRef>> {
        self.call(|layer, next| layer.get_image(next, rect))
    }

    /// Forward [`DeviceLayer::get_device_caps`]
    pub fn get_device_caps(self, cap: DeviceCap) -> i32 {
        self.call(|layer, next| layer.get_device_caps(next, cap))
    }

    /// Forward [`DeviceLayer::get_device_gamma_ramp`]
    pub fn get_device_gamma_ramp(self) -> Option<GammaRamp> {
        self.call(|layer, next| layer.get_device_gamma_ramp(next))
    }

    /// Forward [`DeviceLayer::set_device_gamma_ramp`]
    pub fn set_device_gamma_ramp(self, ramp: &GammaRamp) -> bool {
        self.call(|layer, next| layer.set_device_gamma_ramp(next, ramp))
    }
}
