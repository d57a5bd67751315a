//! Mapping-mode transform pipeline
//!
//! A logical point goes through the world transform (world to page), then the
//! window-to-viewport mapping (page to device). Both are cached together with
//! their product and its inverse; the inverse is `None` whenever the product
//! is singular, and the device-to-logical conversions fail on that.

use crate::arena::DcAttr;
use crate::foundation::math::{mul_div, Point, Rect, Size, Xform};

use super::modes::{Layout, MapMode};

/// Cached transforms of one device context
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transforms {
    /// World to page
    pub world: Xform,
    /// Page to device
    pub window_to_viewport: Xform,
    /// World to device
    pub world_to_device: Xform,
    /// Device to world, `None` while the forward transform is singular
    pub device_to_world: Option<Xform>,
}

impl Default for Transforms {
    fn default() -> Self {
        Self {
            world: Xform::IDENTITY,
            window_to_viewport: Xform::IDENTITY,
            world_to_device: Xform::IDENTITY,
            device_to_world: Some(Xform::IDENTITY),
        }
    }
}

impl Transforms {
    /// Whether device coordinates can be mapped back to logical ones
    pub fn inverse_valid(&self) -> bool {
        self.device_to_world.is_some()
    }

    /// Recompute the page and combined transforms from the attributes
    ///
    /// Returns `true` when the linear part of the combined transform changed,
    /// in which case pens and fonts must be realized again.
    pub fn update(&mut self, attr: &DcAttr, vis_rect: &Rect, epsilon: f64) -> bool {
        let previous = self.world_to_device;
        self.window_to_viewport = window_to_viewport(attr, vis_rect);
        self.world_to_device = self.world.then(&self.window_to_viewport);
        self.device_to_world = if self.world_to_device.is_finite() {
            self.world_to_device.invert(epsilon)
        } else {
            None
        };
        if self.device_to_world.is_none() {
            log::debug!("Device context {:#x} has a singular transform", attr.hdc);
        }
        !previous.linear_eq(&self.world_to_device)
    }

    /// Logical to device, rounding to the nearest pixel
    pub fn lp_to_dp(&self, point: Point) -> Point {
        self.world_to_device.transform_int(point)
    }

    /// Device to logical, `None` when the inverse is invalid
    pub fn dp_to_lp(&self, point: Point) -> Option<Point> {
        self.device_to_world.map(|inverse| inverse.transform_int(point))
    }

    /// Map both corners of a logical rectangle to device space and normalize
    pub fn rect_to_device(&self, rect: &Rect) -> Rect {
        let a = self.lp_to_dp(Point::new(rect.left, rect.top));
        let b = self.lp_to_dp(Point::new(rect.right, rect.bottom));
        Rect::new(a.x, a.y, b.x, b.y).normalized()
    }

    /// Map a device rectangle back to logical space
    pub fn rect_to_logical(&self, rect: &Rect) -> Option<Rect> {
        let a = self.dp_to_lp(Point::new(rect.left, rect.top))?;
        let b = self.dp_to_lp(Point::new(rect.right, rect.bottom))?;
        Some(Rect::new(a.x, a.y, b.x, b.y).normalized())
    }
}

/// Page-to-device transform for the current window and viewport
///
/// A zero window extent yields a zero scale on that axis rather than an
/// infinite one, so the inverse comes out singular instead of NaN.
pub fn window_to_viewport(attr: &DcAttr, vis_rect: &Rect) -> Xform {
    let scale = |viewport: i32, window: i32| {
        if window == 0 {
            0.0
        } else {
            f64::from(viewport) / f64::from(window)
        }
    };
    let mut scale_x = scale(attr.viewport_ext.cx, attr.window_ext.cx);
    let scale_y = scale(attr.viewport_ext.cy, attr.window_ext.cy);

    let mut dx = 0.0;
    if Layout::from_bits_truncate(attr.layout).contains(Layout::RTL) {
        scale_x = -scale_x;
        dx = f64::from(vis_rect.width() - 1);
    }
    dx -= scale_x * f64::from(attr.window_org.x) - f64::from(attr.viewport_org.x);
    let dy = f64::from(attr.viewport_org.y) - scale_y * f64::from(attr.window_org.y);

    Xform::scale_translate(scale_x, scale_y, dx, dy)
}

/// Window and viewport extents a fixed mapping mode prescribes
///
/// `size_mm` and `resolution` are the `HORZSIZE`/`VERTSIZE` and
/// `HORZRES`/`VERTRES` device capabilities. Returns `None` for the
/// caller-defined modes, which keep their current extents.
pub fn fixed_extents(mode: MapMode, size_mm: Size, resolution: Size) -> Option<(Size, Size)> {
    let viewport = Size::new(resolution.cx, -resolution.cy);
    let window = match mode {
        MapMode::Text => return Some((Size::new(1, 1), Size::new(1, 1))),
        MapMode::LoMetric | MapMode::Isotropic => {
            Size::new(size_mm.cx.saturating_mul(10), size_mm.cy.saturating_mul(10))
        }
        MapMode::HiMetric => Size::new(size_mm.cx.saturating_mul(100), size_mm.cy.saturating_mul(100)),
        MapMode::LoEnglish => Size::new(mul_div(1000, size_mm.cx, 254), mul_div(1000, size_mm.cy, 254)),
        MapMode::HiEnglish => Size::new(mul_div(10000, size_mm.cx, 254), mul_div(10000, size_mm.cy, 254)),
        MapMode::Twips => Size::new(mul_div(14400, size_mm.cx, 254), mul_div(14400, size_mm.cy, 254)),
        MapMode::Anisotropic => return None,
    };
    Some((window, viewport))
}

/// Shrink one viewport axis so both axes scale by the same magnitude
pub fn fix_isotropic(window: Size, viewport: &mut Size) {
    let xdim = (f64::from(viewport.cx) * f64::from(window.cy)).abs();
    let ydim = (f64::from(viewport.cy) * f64::from(window.cx)).abs();

    if xdim > ydim {
        let min = if viewport.cx >= 0 { 1 } else { -1 };
        viewport.cx = (f64::from(viewport.cx) * ydim / xdim + 0.5).floor() as i32;
        if viewport.cx == 0 {
            viewport.cx = min;
        }
    } else if xdim < ydim {
        let min = if viewport.cy >= 0 { 1 } else { -1 };
        viewport.cy = (f64::from(viewport.cy) * xdim / ydim + 0.5).floor() as i32;
        if viewport.cy == 0 {
            viewport.cy = min;
        }
    }
}

/// Product of two transforms, `first` applied before `second`
pub fn combine_transform(first: &Xform, second: &Xform) -> Xform {
    Xform::new(
        first.m11 * second.m11 + first.m12 * second.m21,
        first.m11 * second.m12 + first.m12 * second.m22,
        first.m21 * second.m11 + first.m22 * second.m21,
        first.m21 * second.m12 + first.m22 * second.m22,
        first.dx * second.m11 + first.dy * second.m21 + second.dx,
        first.dx * second.m12 + first.dy * second.m22 + second.dy,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Point2d, DEFAULT_SINGULAR_EPSILON};
    use approx::assert_relative_eq;

    const EPSILON: f64 = 1e-9;

    fn attr() -> DcAttr {
        DcAttr {
            window_ext: Size::new(1, 1),
            viewport_ext: Size::new(1, 1),
            ..DcAttr::default()
        }
    }

    #[test]
    fn test_identity_by_default() {
        let mut transforms = Transforms::default();
        let changed = transforms.update(&attr(), &Rect::new(0, 0, 100, 100), DEFAULT_SINGULAR_EPSILON);
        assert!(!changed);
        assert_eq!(transforms.lp_to_dp(Point::new(7, -3)), Point::new(7, -3));
        assert_eq!(transforms.dp_to_lp(Point::new(7, -3)), Some(Point::new(7, -3)));
    }

    #[test]
    fn test_scale_and_origin() {
        let mut attr = attr();
        attr.window_ext = Size::new(100, 100);
        attr.viewport_ext = Size::new(200, -50);
        attr.window_org = Point::new(10, 10);
        attr.viewport_org = Point::new(5, 400);

        let xform = window_to_viewport(&attr, &Rect::new(0, 0, 640, 480));
        let p = xform.transform_point(Point2d::new(20.0, 30.0));
        assert_relative_eq!(p.x, 25.0, epsilon = EPSILON);
        assert_relative_eq!(p.y, 390.0, epsilon = EPSILON);
    }

    #[test]
    fn test_rtl_mirrors_across_visible_area() {
        let mut attr = attr();
        attr.layout = Layout::RTL.bits();
        let xform = window_to_viewport(&attr, &Rect::new(0, 0, 100, 50));
        assert_eq!(xform.transform_int(Point::new(0, 0)), Point::new(99, 0));
        assert_eq!(xform.transform_int(Point::new(99, 10)), Point::new(0, 10));
    }

    #[test]
    fn test_zero_window_extent_marks_inverse_invalid() {
        let mut attr = attr();
        attr.window_ext = Size::new(0, 1);
        let mut transforms = Transforms::default();
        let changed = transforms.update(&attr, &Rect::new(0, 0, 10, 10), DEFAULT_SINGULAR_EPSILON);
        assert!(changed);
        assert!(!transforms.inverse_valid());
        assert!(transforms.world_to_device.is_finite());
        assert_eq!(transforms.dp_to_lp(Point::new(1, 1)), None);
    }

    #[test]
    fn test_inverse_law() {
        let mut attr = attr();
        attr.window_ext = Size::new(3, 7);
        attr.viewport_ext = Size::new(11, -5);
        attr.viewport_org = Point::new(13, 17);
        let mut transforms = Transforms {
            world: Xform::new(1.5, 0.25, -0.5, 2.0, 4.0, -8.0),
            ..Transforms::default()
        };
        transforms.update(&attr, &Rect::new(0, 0, 10, 10), DEFAULT_SINGULAR_EPSILON);

        let forward = transforms.world_to_device;
        let inverse = transforms.device_to_world.unwrap();
        let p = Point2d::new(-12.5, 33.0);
        let back = inverse.transform_point(forward.transform_point(p));
        assert_relative_eq!(back.x, p.x, epsilon = EPSILON);
        assert_relative_eq!(back.y, p.y, epsilon = EPSILON);
    }

    #[test]
    fn test_metric_extents() {
        let size = Size::new(320, 240);
        let res = Size::new(1280, 960);
        let (window, viewport) = fixed_extents(MapMode::LoMetric, size, res).unwrap();
        assert_eq!(window, Size::new(3200, 2400));
        assert_eq!(viewport, Size::new(1280, -960));

        let (window, _) = fixed_extents(MapMode::Twips, size, res).unwrap();
        assert_eq!(window, Size::new(mul_div(14400, 320, 254), mul_div(14400, 240, 254)));
        assert!(fixed_extents(MapMode::Anisotropic, size, res).is_none());
    }

    #[test]
    fn test_fix_isotropic_shrinks_larger_axis() {
        let mut viewport = Size::new(200, -100);
        fix_isotropic(Size::new(100, 100), &mut viewport);
        assert_eq!(viewport, Size::new(100, -100));

        let mut viewport = Size::new(1, 1000);
        fix_isotropic(Size::new(1000, 1), &mut viewport);
        assert_eq!(viewport, Size::new(1, 1));
    }

    #[test]
    fn test_combine_matches_then() {
        let a = Xform::new(2.0, 1.0, 0.5, 3.0, 4.0, 5.0);
        let b = Xform::new(0.0, -1.0, 1.0, 0.0, -2.0, 7.0);
        let combined = combine_transform(&a, &b);
        let expected = a.then(&b);
        assert_relative_eq!(combined.m11, expected.m11, epsilon = EPSILON);
        assert_relative_eq!(combined.m21, expected.m21, epsilon = EPSILON);
        assert_relative_eq!(combined.dx, expected.dx, epsilon = EPSILON);
        assert_relative_eq!(combined.dy, expected.dy, epsilon = EPSILON);
    }
}
