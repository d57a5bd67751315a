//! Drawing, text and device queries
//!
//! Coordinates come in logical units and reach the layers in device units.
//! While a path is open, line drawing is recorded instead of dispatched.

use crate::dc::modes::TextAlign;
use crate::dc::path::Path;
use crate::dc::DcState;
use crate::driver::{check_gamma_ramp, DeviceCap, GammaRamp, TextMetrics};
use crate::error::{GdiError, GdiResult};
use crate::foundation::color::ColorRef;
use crate::foundation::math::{Point, Rect, Size};
use crate::handle::Handle;

use super::Gdi;

/// Device pixels touched by a segment
fn line_bounds(from: Point, to: Point) -> Rect {
    Rect::new(
        from.x.min(to.x),
        from.y.min(to.y),
        from.x.max(to.x).saturating_add(1),
        from.y.max(to.y).saturating_add(1),
    )
}

fn recording(state: &DcState) -> bool {
    state.path().map_or(false, Path::is_open)
}

/// Device extent expressed in logical units along each axis
fn extent_to_logical(state: &DcState, extent: Size) -> GdiResult<Size> {
    let corners = state.dp_to_lp(&[Point::new(0, 0), Point::new(extent.cx, extent.cy)])?;
    Ok(Size::new(
        corners[1].x.saturating_sub(corners[0].x).saturating_abs(),
        corners[1].y.saturating_sub(corners[0].y).saturating_abs(),
    ))
}

impl Gdi {
    /// Move the current position without drawing, returning the previous one
    pub fn move_to(&self, hdc: Handle, point: Point) -> GdiResult<Point> {
        self.with_dc(hdc, |state| {
            if let Some(path) = state.path_mut().as_mut().filter(|path| path.is_open()) {
                path.move_to();
            }
            Ok(std::mem::replace(&mut state.attr_mut().cur_pos, point))
        })
    }

    /// Draw from the current position to `point`, which becomes current
    pub fn line_to(&self, hdc: Handle, point: Point) -> GdiResult<()> {
        self.with_dc(hdc, |state| {
            let from = state.transforms().lp_to_dp(state.attr().cur_pos);
            let to = state.transforms().lp_to_dp(point);
            if recording(state) {
                if let Some(path) = state.path_mut() {
                    path.line_to(from, to)?;
                }
            } else {
                if !state.chain().head().line_to(from, to) {
                    return Err(GdiError::Unsupported("line drawing"));
                }
                state.accumulate_bounds(&line_bounds(from, to));
            }
            state.attr_mut().cur_pos = point;
            Ok(())
        })
    }

    /// Outline with the pen and fill with the brush
    pub fn rectangle(&self, hdc: Handle, rect: Rect) -> GdiResult<()> {
        self.with_dc(hdc, |state| {
            let device = state.transforms().rect_to_device(&rect);
            if recording(state) {
                let corners = [
                    Point::new(device.left, device.top),
                    Point::new(device.right, device.top),
                    Point::new(device.right, device.bottom),
                    Point::new(device.left, device.bottom),
                ];
                return match state.path_mut() {
                    Some(path) => path.polygon(&corners),
                    None => Ok(()),
                };
            }
            if !state.chain().head().rectangle(device) {
                return Err(GdiError::Unsupported("rectangle"));
            }
            state.accumulate_bounds(&device);
            Ok(())
        })
    }

    /// Ellipse inscribed in `rect`
    pub fn ellipse(&self, hdc: Handle, rect: Rect) -> GdiResult<()> {
        self.with_dc(hdc, |state| {
            if recording(state) {
                return Err(GdiError::Unsupported("curves in paths"));
            }
            let device = state.transforms().rect_to_device(&rect);
            if !state.chain().head().ellipse(device) {
                return Err(GdiError::Unsupported("ellipse"));
            }
            state.accumulate_bounds(&device);
            Ok(())
        })
    }

    /// Connected segments through `points`; the current position is unchanged
    pub fn polyline(&self, hdc: Handle, points: &[Point]) -> GdiResult<()> {
        if points.len() < 2 {
            return Err(GdiError::invalid("a polyline needs at least two points"));
        }
        self.with_dc(hdc, |state| {
            let device = state.lp_to_dp(points);
            if recording(state) {
                if let Some(path) = state.path_mut() {
                    path.move_to();
                    for pair in device.windows(2) {
                        path.line_to(pair[0], pair[1])?;
                    }
                }
                return Ok(());
            }
            if !state.chain().head().polyline(&device) {
                return Err(GdiError::Unsupported("polyline"));
            }
            for pair in device.windows(2) {
                state.accumulate_bounds(&line_bounds(pair[0], pair[1]));
            }
            Ok(())
        })
    }

    /// Paint `rect` with the brush combined through a raster operation
    pub fn pat_blt(&self, hdc: Handle, rect: Rect, rop: u32) -> GdiResult<()> {
        self.with_dc(hdc, |state| {
            let device = state.transforms().rect_to_device(&rect);
            if !state.chain().head().pat_blt(device, rop) {
                return Err(GdiError::Unsupported("pattern blit"));
            }
            state.accumulate_bounds(&device);
            Ok(())
        })
    }

    /// Set one pixel, returning the color actually stored
    ///
    /// [`ColorRef::INVALID`] means no layer stored the pixel, for example a
    /// point outside the surface or a chain without a surface.
    pub fn set_pixel(&self, hdc: Handle, point: Point, color: ColorRef) -> GdiResult<ColorRef> {
        self.with_dc(hdc, |state| {
            let device = state.transforms().lp_to_dp(point);
            let stored = state.chain().head().set_pixel(device, color);
            if stored != ColorRef::INVALID {
                state.accumulate_bounds(&line_bounds(device, device));
            }
            Ok(stored)
        })
    }

    /// Read one pixel; [`ColorRef::INVALID`] when there is none to read
    pub fn get_pixel(&self, hdc: Handle, point: Point) -> GdiResult<ColorRef> {
        self.with_dc(hdc, |state| {
            let device = state.transforms().lp_to_dp(point);
            Ok(state.chain().head().get_pixel(device))
        })
    }

    /// Draw a string
    ///
    /// With [`TextAlign::UPDATE_CP`] the text starts at the current position,
    /// which then advances past it; `origin` is ignored.
    pub fn ext_text_out(&self, hdc: Handle, origin: Point, text: &str, clip: Option<Rect>) -> GdiResult<()> {
        self.with_dc(hdc, |state| {
            let update_cp = TextAlign::from_bits_truncate(state.attr().text_align).contains(TextAlign::UPDATE_CP);
            let origin = if update_cp { state.attr().cur_pos } else { origin };
            let device_origin = state.transforms().lp_to_dp(origin);
            let device_clip = clip.map(|rect| state.transforms().rect_to_device(&rect));

            if !state.chain().head().ext_text_out(device_origin, text, device_clip) {
                return Err(GdiError::Unsupported("text output"));
            }
            let extent = state.chain().head().get_text_extent(text);
            if let Some(extent) = extent {
                let drawn = Rect::new(
                    device_origin.x,
                    device_origin.y,
                    device_origin.x.saturating_add(extent.cx),
                    device_origin.y.saturating_add(extent.cy),
                );
                state.accumulate_bounds(&drawn);
                if update_cp {
                    let advance = extent_to_logical(state, extent)?;
                    let cur_pos = &mut state.attr_mut().cur_pos;
                    cur_pos.x = cur_pos.x.saturating_add(advance.cx);
                }
            }
            Ok(())
        })
    }

    /// Metrics of the selected font as realized by the device
    pub fn get_text_metrics(&self, hdc: Handle) -> GdiResult<TextMetrics> {
        self.with_dc(hdc, |state| {
            state
                .chain()
                .head()
                .get_text_metrics()
                .ok_or(GdiError::Unsupported("text metrics"))
        })
    }

    /// Size of a string in logical units, including the extra character spacing
    pub fn get_text_extent(&self, hdc: Handle, text: &str) -> GdiResult<Size> {
        self.with_dc(hdc, |state| {
            let device = state
                .chain()
                .head()
                .get_text_extent(text)
                .ok_or(GdiError::Unsupported("text extents"))?;
            let mut logical = extent_to_logical(state, device)?;
            let count = i32::try_from(text.chars().count()).unwrap_or(i32::MAX);
            logical.cx = logical.cx.saturating_add(count.saturating_mul(state.attr().char_extra));
            Ok(logical)
        })
    }

    /// Pixels of a device rectangle, row by row
    pub fn get_image(&self, hdc: Handle, rect: Rect) -> GdiResult<Vec<ColorRef>> {
        self.with_dc(hdc, |state| {
            state
                .chain()
                .head()
                .get_image(rect)
                .ok_or_else(|| GdiError::invalid(format!("no image for {rect:?}")))
        })
    }

    /// One device capability
    pub fn get_device_caps(&self, hdc: Handle, cap: DeviceCap) -> GdiResult<i32> {
        self.with_dc(hdc, |state| Ok(state.chain().head().get_device_caps(cap)))
    }

    /// Map the default palette into the device; returns the entries mapped
    pub fn realize_default_palette(&self, hdc: Handle) -> GdiResult<u32> {
        self.with_dc(hdc, |state| Ok(state.chain().head().realize_default_palette()))
    }

    /// The display's gamma ramp
    pub fn get_device_gamma_ramp(&self, hdc: Handle) -> GdiResult<GammaRamp> {
        self.with_dc(hdc, |state| {
            if state.is_memory() {
                return Err(GdiError::invalid("memory contexts have no gamma ramp"));
            }
            state
                .chain()
                .head()
                .get_device_gamma_ramp()
                .ok_or(GdiError::Unsupported("gamma ramps"))
        })
    }

    /// Replace the display's gamma ramp after a plausibility check
    pub fn set_device_gamma_ramp(&self, hdc: Handle, ramp: &GammaRamp) -> GdiResult<()> {
        if !check_gamma_ramp(ramp) {
            return Err(GdiError::invalid("implausible gamma ramp"));
        }
        self.with_dc(hdc, |state| {
            if state.is_memory() {
                return Err(GdiError::invalid("memory contexts have no gamma ramp"));
            }
            if state.chain().head().set_device_gamma_ramp(ramp) {
                Ok(())
            } else {
                Err(GdiError::Unsupported("gamma ramps"))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GdiConfig;
    use crate::dc::modes::{BoundsFlags, MapMode};
    use crate::dc::path::PathVertex;
    use crate::driver::rop;
    use crate::object::PenStyle;

    fn memory_dc(gdi: &Gdi, width: i32, height: i32) -> Handle {
        let hdc = gdi.create_compatible_dc(None).unwrap();
        let bitmap = gdi.create_bitmap(width, height, 32).unwrap();
        gdi.select_object(hdc, bitmap).unwrap();
        hdc
    }

    #[test]
    fn test_line_updates_position_and_pixels() {
        let gdi = Gdi::new(GdiConfig::default()).unwrap();
        let hdc = memory_dc(&gdi, 8, 8);
        let pen = gdi.create_pen(PenStyle::Solid, 1, ColorRef::rgb(255, 0, 0)).unwrap();
        gdi.select_object(hdc, pen).unwrap();

        gdi.move_to(hdc, Point::new(1, 2)).unwrap();
        gdi.line_to(hdc, Point::new(5, 2)).unwrap();
        assert_eq!(gdi.get_current_position(hdc).unwrap(), Point::new(5, 2));
        assert_eq!(gdi.get_pixel(hdc, Point::new(3, 2)).unwrap(), ColorRef::rgb(255, 0, 0));
        assert_eq!(gdi.get_pixel(hdc, Point::new(3, 3)).unwrap(), ColorRef::BLACK);
        assert_eq!(gdi.get_pixel(hdc, Point::new(9, 9)).unwrap(), ColorRef::INVALID);
    }

    #[test]
    fn test_path_records_instead_of_drawing() {
        let gdi = Gdi::new(GdiConfig::default()).unwrap();
        let hdc = memory_dc(&gdi, 8, 8);
        gdi.select_object(hdc, gdi.get_stock_object(crate::object::StockObject::WhitePen))
            .unwrap();
        gdi.begin_path(hdc).unwrap();
        gdi.move_to(hdc, Point::new(0, 0)).unwrap();
        gdi.line_to(hdc, Point::new(4, 0)).unwrap();
        gdi.line_to(hdc, Point::new(4, 4)).unwrap();
        gdi.close_figure(hdc).unwrap();
        assert!(gdi.ellipse(hdc, Rect::new(0, 0, 2, 2)).is_err());
        gdi.end_path(hdc).unwrap();

        assert_eq!(gdi.get_pixel(hdc, Point::new(2, 0)).unwrap(), ColorRef::BLACK);
        assert_eq!(
            gdi.get_path(hdc).unwrap(),
            vec![
                (Point::new(0, 0), PathVertex::MoveTo),
                (Point::new(4, 0), PathVertex::LineTo),
                (Point::new(4, 4), PathVertex::CloseFigure),
            ]
        );
    }

    #[test]
    fn test_pat_blt_and_bounds() {
        let gdi = Gdi::new(GdiConfig::default()).unwrap();
        let hdc = memory_dc(&gdi, 4, 4);
        gdi.set_bounds_rect(hdc, None, BoundsFlags::ENABLE).unwrap();
        gdi.pat_blt(hdc, Rect::new(0, 0, 2, 2), rop::WHITENESS).unwrap();
        assert_eq!(gdi.get_image(hdc, Rect::new(0, 0, 2, 1)).unwrap(), vec![ColorRef::WHITE; 2]);
        let (bounds, state) = gdi.get_bounds_rect(hdc, BoundsFlags::empty()).unwrap();
        assert!(state.dirty);
        assert_eq!(bounds, Rect::new(0, 0, 2, 2));
        assert!(gdi.get_image(hdc, Rect::new(0, 0, 5, 5)).is_err());
    }

    #[test]
    fn test_text_on_display_context() {
        let gdi = Gdi::new(GdiConfig::default()).unwrap();
        let hdc = gdi.create_dc("DISPLAY").unwrap();
        let metrics = gdi.get_text_metrics(hdc).unwrap();
        let extent = gdi.get_text_extent(hdc, "abcd").unwrap();
        assert_eq!(extent, Size::new(4 * metrics.ave_char_width, metrics.height));

        gdi.set_text_align(hdc, TextAlign::UPDATE_CP).unwrap();
        gdi.move_to(hdc, Point::new(10, 10)).unwrap();
        gdi.ext_text_out(hdc, Point::new(500, 500), "abcd", None).unwrap();
        assert_eq!(
            gdi.get_current_position(hdc).unwrap(),
            Point::new(10 + extent.cx, 10)
        );

        gdi.set_map_mode(hdc, MapMode::Anisotropic).unwrap();
        gdi.set_viewport_ext(hdc, Size::new(2, 2)).unwrap();
        assert_eq!(gdi.get_text_extent(hdc, "abcd").unwrap().cx, extent.cx / 2);
        gdi.delete_dc(hdc).unwrap();
    }

    #[test]
    fn test_gamma_ramp_rules() {
        let gdi = Gdi::new(GdiConfig::default()).unwrap();
        let display = gdi.create_dc("DISPLAY").unwrap();
        let memory = gdi.create_compatible_dc(None).unwrap();
        assert!(gdi.get_device_gamma_ramp(memory).is_err());
        assert!(gdi.set_device_gamma_ramp(display, &GammaRamp::from_gamma(0.1)).is_err());

        let ramp = GammaRamp::from_gamma(1.2);
        gdi.set_device_gamma_ramp(display, &ramp).unwrap();
        assert_eq!(gdi.get_device_gamma_ramp(display).unwrap(), ramp);
        assert_eq!(gdi.get_device_caps(display, DeviceCap::HorzRes).unwrap(), 1024);
    }
}
