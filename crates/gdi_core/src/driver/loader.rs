//! Lazy display driver resolution

use std::sync::{Arc, OnceLock};

use super::backend::{BackendContext, BackendRegistry, DisplayBackend};
use super::caps::DeviceCap;
use super::gamma::GammaRamp;
use super::layer::{DeviceLayer, Next};
use super::TextMetrics;
use crate::foundation::color::ColorRef;
use crate::foundation::math::{Point, Rect, Size};
use crate::handle::Handle;
use crate::object::{Bitmap, LogBrush, LogFont, LogPen};

/// Resolves the configured display backend once per process
///
/// Threads that race on the first load each build a candidate; exactly one
/// is installed and every caller, winner or not, continues with it.
pub struct DriverLoader {
    registry: BackendRegistry,
    driver: String,
    context: BackendContext,
    current: OnceLock<Arc<dyn DisplayBackend>>,
}

impl std::fmt::Debug for DriverLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverLoader")
            .field("driver", &self.driver)
            .field("loaded", &self.current.get().map(|b| b.name().to_string()))
            .finish()
    }
}

impl DriverLoader {
    /// Loader that will resolve `driver` from `registry`
    pub fn new(registry: BackendRegistry, driver: impl Into<String>, context: BackendContext) -> Self {
        Self {
            registry,
            driver: driver.into(),
            context,
            current: OnceLock::new(),
        }
    }

    /// Configured backend name
    pub fn driver(&self) -> &str {
        &self.driver
    }

    /// Whether a backend has been installed
    pub fn is_loaded(&self) -> bool {
        self.current.get().is_some()
    }

    /// The installed backend, loading it on first call
    pub fn backend(&self) -> Arc<dyn DisplayBackend> {
        if let Some(backend) = self.current.get() {
            return backend.clone();
        }

        let candidate = self.registry.resolve(&self.driver, &self.context);
        match self.current.set(candidate.clone()) {
            Ok(()) => {
                log::info!("Loaded display driver {:?}", candidate.name());
                candidate
            }
            Err(_) => {
                log::debug!("Display driver already installed by another thread");
                self.current.get().cloned().unwrap_or(candidate)
            }
        }
    }

    /// Stand-in layer for a new display context
    pub fn lazy_layer(self: &Arc<Self>) -> LazyDisplayLayer {
        LazyDisplayLayer {
            loader: Arc::clone(self),
            inner: None,
            resolved: false,
        }
    }
}

/// Placeholder for the display backend's layer
///
/// The first operation routed through it loads the driver and creates the
/// backend's layer; from then on every operation is handed to that layer,
/// or straight down the chain when the backend has none.
pub struct LazyDisplayLayer {
    loader: Arc<DriverLoader>,
    inner: Option<Box<dyn DeviceLayer>>,
    resolved: bool,
}

impl LazyDisplayLayer {
    /// Whether the backend layer has been created
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    fn target(&mut self) -> Option<&mut (dyn DeviceLayer + 'static)> {
        if !self.resolved {
            self.inner = self.loader.backend().create_layer();
            self.resolved = true;
        }
        self.inner.as_deref_mut()
    }
}

impl DeviceLayer for LazyDisplayLayer {
    fn name(&self) -> &'static str {
        match &self.inner {
            Some(inner) => inner.name(),
            None => "lazy-display",
        }
    }

    fn delete_dc(&mut self) {
        if let Some(inner) = self.inner.as_mut() {
            inner.delete_dc();
        }
    }

    fn set_bk_color(&mut self, next: Next<'_>, color: ColorRef) -> ColorRef {
        match self.target() {
            Some(layer) => layer.set_bk_color(next, color),
            None => next.set_bk_color(color),
        }
    }

    fn set_text_color(&mut self, next: Next<'_>, color: ColorRef) -> ColorRef {
        match self.target() {
            Some(layer) => layer.set_text_color(next, color),
            None => next.set_text_color(color),
        }
    }

    fn set_dc_brush_color(&mut self, next: Next<'_>, color: ColorRef) -> ColorRef {
        match self.target() {
            Some(layer) => layer.set_dc_brush_color(next, color),
            None => next.set_dc_brush_color(color),
        }
    }

    fn set_dc_pen_color(&mut self, next: Next<'_>, color: ColorRef) -> ColorRef {
        match self.target() {
            Some(layer) => layer.set_dc_pen_color(next, color),
            None => next.set_dc_pen_color(color),
        }
    }

    fn set_arc_direction(&mut self, next: Next<'_>, direction: u32) -> u32 {
        match self.target() {
            Some(layer) => layer.set_arc_direction(next, direction),
            None => next.set_arc_direction(direction),
        }
    }

    fn set_layout(&mut self, next: Next<'_>, layout: u32) -> u32 {
        match self.target() {
            Some(layer) => layer.set_layout(next, layout),
            None => next.set_layout(layout),
        }
    }

    fn select_pen(&mut self, next: Next<'_>, handle: Handle, pen: &LogPen) -> bool {
        match self.target() {
            Some(layer) => layer.select_pen(next, handle, pen),
            None => next.select_pen(handle, pen),
        }
    }

    fn select_brush(&mut self, next: Next<'_>, handle: Handle, brush: &LogBrush) -> bool {
        match self.target() {
            Some(layer) => layer.select_brush(next, handle, brush),
            None => next.select_brush(handle, brush),
        }
    }

    fn select_font(&mut self, next: Next<'_>, handle: Handle, font: &LogFont) -> bool {
        match self.target() {
            Some(layer) => layer.select_font(next, handle, font),
            None => next.select_font(handle, font),
        }
    }

    fn select_bitmap(&mut self, next: Next<'_>, handle: Handle, bitmap: &Bitmap) -> bool {
        match self.target() {
            Some(layer) => layer.select_bitmap(next, handle, bitmap),
            None => next.select_bitmap(handle, bitmap),
        }
    }

    fn select_palette(&mut self, next: Next<'_>, handle: Handle, background: bool) -> bool {
        match self.target() {
            Some(layer) => layer.select_palette(next, handle, background),
            None => next.select_palette(handle, background),
        }
    }

    fn realize_default_palette(&mut self, next: Next<'_>) -> u32 {
        match self.target() {
            Some(layer) => layer.realize_default_palette(next),
            None => next.realize_default_palette(),
        }
    }

    fn delete_object(&mut self, next: Next<'_>, handle: Handle) -> bool {
        match self.target() {
            Some(layer) => layer.delete_object(next, handle),
            None => next.delete_object(handle),
        }
    }

    fn save_dc(&mut self, next: Next<'_>, level: i32) -> bool {
        match self.target() {
            Some(layer) => layer.save_dc(next, level),
            None => next.save_dc(level),
        }
    }

    fn restore_dc(&mut self, next: Next<'_>, level: i32) -> bool {
        match self.target() {
            Some(layer) => layer.restore_dc(next, level),
            None => next.restore_dc(level),
        }
    }

    fn line_to(&mut self, next: Next<'_>, from: Point, to: Point) -> bool {
        match self.target() {
            Some(layer) => layer.line_to(next, from, to),
            None => next.line_to(from, to),
        }
    }

    fn rectangle(&mut self, next: Next<'_>, rect: Rect) -> bool {
        match self.target() {
            Some(layer) => layer.rectangle(next, rect),
            None => next.rectangle(rect),
        }
    }

    fn ellipse(&mut self, next: Next<'_>, rect: Rect) -> bool {
        match self.target() {
            Some(layer) => layer.ellipse(next, rect),
            None => next.ellipse(rect),
        }
    }

    fn polyline(&mut self, next: Next<'_>, points: &[Point]) -> bool {
        match self.target() {
            Some(layer) => layer.polyline(next, points),
            None => next.polyline(points),
        }
    }

    fn pat_blt(&mut self, next: Next<'_>, rect: Rect, rop: u32) -> bool {
        match self.target() {
            Some(layer) => layer.pat_blt(next, rect, rop),
            None => next.pat_blt(rect, rop),
        }
    }

    fn set_pixel(&mut self, next: Next<'_>, point: Point, color: ColorRef) -> ColorRef {
        match self.target() {
            Some(layer) => layer.set_pixel(next, point, color),
            None => next.set_pixel(point, color),
        }
    }

    fn get_pixel(&mut self, next: Next<'_>, point: Point) -> ColorRef {
        match self.target() {
            Some(layer) => layer.get_pixel(next, point),
            None => next.get_pixel(point),
        }
    }

    fn ext_text_out(&mut self, next: Next<'_>, origin: Point, text: &str, clip: Option<Rect>) -> bool {
        match self.target() {
            Some(layer) => layer.ext_text_out(next, origin, text, clip),
            None => next.ext_text_out(origin, text, clip),
        }
    }

    fn get_text_metrics(&mut self, next: Next<'_>) -> Option<TextMetrics> {
        match self.target() {
            Some(layer) => layer.get_text_metrics(next),
            None => next.get_text_metrics(),
        }
    }

    fn get_text_extent(&mut self, next: Next<'_>, text: &str) -> Option<Size> {
        match self.target() {
            Some(layer) => layer.get_text_extent(next, text),
            None => next.get_text_extent(text),
        }
    }

    fn get_image(&mut self, next: Next<'_>, rect: Rect) -> Option<Vec<ColorRef>> {
        match self.target() {
            Some(layer) => layer.get_image(next, rect),
            None => next.get_image(rect),
        }
    }

    fn get_device_caps(&mut self, next: Next<'_>, cap: DeviceCap) -> i32 {
        match self.target() {
            Some(layer) => layer.get_device_caps(next, cap),
            None => next.get_device_caps(cap),
        }
    }

    fn get_device_gamma_ramp(&mut self, next: Next<'_>) -> Option<GammaRamp> {
        match self.target() {
            Some(layer) => layer.get_device_gamma_ramp(next),
            None => next.get_device_gamma_ramp(),
        }
    }

    fn set_device_gamma_ramp(&mut self, next: Next<'_>, ramp: &GammaRamp) -> bool {
        match self.target() {
            Some(layer) => layer.set_device_gamma_ramp(next, ramp),
            None => next.set_device_gamma_ramp(ramp),
        }
    }
}
