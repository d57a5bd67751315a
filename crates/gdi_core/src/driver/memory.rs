//! Layer drawing into the bitmap selected in a memory context

use super::caps::DeviceCap;
use super::layer::{DeviceLayer, Next};
use super::rop;
use crate::foundation::color::ColorRef;
use crate::foundation::math::{Point, Rect};
use crate::handle::Handle;
use crate::object::{Bitmap, BrushStyle, LogBrush, LogPen, PenStyle};

/// Pixel operations on the selected bitmap
///
/// Only the operations a flat 32-bit surface can answer directly are
/// implemented; everything else continues down the chain.
#[derive(Debug, Default)]
pub struct MemoryLayer {
    surface: Option<(Handle, Bitmap)>,
    pen: Option<ColorRef>,
    brush: Option<ColorRef>,
}

impl MemoryLayer {
    /// Layer with nothing selected
    pub fn new() -> Self {
        Self::default()
    }

    fn fill(&self, rect: Rect, paint: impl Fn(ColorRef) -> ColorRef) -> bool {
        let Some((_, bitmap)) = &self.surface else {
            return false;
        };
        let Some(clipped) = rect.normalized().intersect(&bitmap.rect()) else {
            return true;
        };
        let mut pixels = bitmap.pixels();
        for y in clipped.top..clipped.bottom {
            for x in clipped.left..clipped.right {
                if let Some(offset) = bitmap.offset(Point::new(x, y)) {
                    pixels[offset] = paint(pixels[offset]);
                }
            }
        }
        true
    }

    fn plot(&self, point: Point, color: ColorRef) -> bool {
        let Some((_, bitmap)) = &self.surface else {
            return false;
        };
        match bitmap.offset(point) {
            Some(offset) => {
                bitmap.pixels()[offset] = color;
                true
            }
            None => false,
        }
    }

    /// Step from `from` towards `to` along the major axis, excluding the end point
    ///
    /// Only the steps that land on the surface are visited, so the cost is
    /// bounded by the bitmap size whatever the segment length.
    fn line(&self, from: Point, to: Point, color: ColorRef) {
        let Some((_, bitmap)) = &self.surface else {
            return;
        };
        let (x0, y0) = (i64::from(from.x), i64::from(from.y));
        let (dx, dy) = (i64::from(to.x) - x0, i64::from(to.y) - y0);
        let (width, height) = (i64::from(bitmap.width), i64::from(bitmap.height));
        let x_major = dx.abs() >= dy.abs();
        let (major0, steps, major_step, minor0, minor_delta, major_len) = if x_major {
            (x0, dx.abs(), dx.signum(), y0, dy, width)
        } else {
            (y0, dy.abs(), dy.signum(), x0, dx, height)
        };
        if steps == 0 {
            return;
        }

        // steps t with 0 <= major0 + major_step * t < major_len
        let (first, last) = if major_step > 0 {
            (-major0, major_len - major0)
        } else {
            (major0 - major_len + 1, major0 + 1)
        };
        let (first, last) = (first.max(0), last.min(steps));

        let mut pixels = bitmap.pixels();
        for t in first..last {
            let major = major0 + major_step * t;
            let minor = minor0 + round_div(i128::from(t) * i128::from(minor_delta), i128::from(steps));
            let (x, y) = if x_major { (major, minor) } else { (minor, major) };
            if let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) {
                if let Some(offset) = bitmap.offset(Point::new(x, y)) {
                    pixels[offset] = color;
                }
            }
        }
    }
}

/// `numerator / denominator` rounded half away from zero; `denominator` is positive
fn round_div(numerator: i128, denominator: i128) -> i64 {
    let half = denominator / 2;
    let quotient = if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        -((half - numerator) / denominator)
    };
    i64::try_from(quotient).unwrap_or(if quotient < 0 { i64::MIN } else { i64::MAX })
}

impl DeviceLayer for MemoryLayer {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn select_pen(&mut self, next: Next<'_>, handle: Handle, pen: &LogPen) -> bool {
        self.pen = (pen.style != PenStyle::Null).then_some(pen.color);
        next.select_pen(handle, pen)
    }

    fn select_brush(&mut self, next: Next<'_>, handle: Handle, brush: &LogBrush) -> bool {
        self.brush = (brush.style != BrushStyle::Null).then_some(brush.color);
        next.select_brush(handle, brush)
    }

    fn select_bitmap(&mut self, _next: Next<'_>, handle: Handle, bitmap: &Bitmap) -> bool {
        self.surface = Some((handle, bitmap.clone()));
        true
    }

    fn delete_object(&mut self, next: Next<'_>, handle: Handle) -> bool {
        if matches!(&self.surface, Some((selected, _)) if *selected == handle) {
            self.surface = None;
        }
        next.delete_object(handle)
    }

    fn line_to(&mut self, next: Next<'_>, from: Point, to: Point) -> bool {
        match (self.pen, self.surface.is_some()) {
            (Some(color), true) => {
                self.line(from, to, color);
                true
            }
            (None, true) => true,
            _ => next.line_to(from, to),
        }
    }

    fn rectangle(&mut self, next: Next<'_>, rect: Rect) -> bool {
        if self.surface.is_none() {
            return next.rectangle(rect);
        }
        let rect = rect.normalized();
        if let Some(color) = self.brush {
            self.fill(rect, |_| color);
        }
        if let Some(color) = self.pen {
            let (l, t) = (rect.left, rect.top);
            let (r, b) = (rect.right.saturating_sub(1), rect.bottom.saturating_sub(1));
            self.line(Point::new(l, t), Point::new(r, t), color);
            self.line(Point::new(r, t), Point::new(r, b), color);
            self.line(Point::new(r, b), Point::new(l, b), color);
            self.line(Point::new(l, b), Point::new(l, t), color);
        }
        true
    }

    fn polyline(&mut self, next: Next<'_>, points: &[Point]) -> bool {
        if self.surface.is_none() {
            return next.polyline(points);
        }
        if let Some(color) = self.pen {
            for pair in points.windows(2) {
                self.line(pair[0], pair[1], color);
            }
        }
        true
    }

    fn pat_blt(&mut self, next: Next<'_>, rect: Rect, code: u32) -> bool {
        if self.surface.is_none() {
            return next.pat_blt(rect, code);
        }
        let brush = self.brush;
        match code {
            rop::PATCOPY => brush.map_or(true, |color| self.fill(rect, |_| color)),
            rop::PATINVERT => brush.map_or(true, |color| self.fill(rect, |dst| ColorRef(dst.0 ^ color.0))),
            rop::DSTINVERT => self.fill(rect, |dst| ColorRef(dst.0 ^ 0x00FF_FFFF)),
            rop::BLACKNESS => self.fill(rect, |_| ColorRef::BLACK),
            rop::WHITENESS => self.fill(rect, |_| ColorRef::WHITE),
            _ => next.pat_blt(rect, code),
        }
    }

    fn set_pixel(&mut self, next: Next<'_>, point: Point, color: ColorRef) -> ColorRef {
        if self.surface.is_none() {
            return next.set_pixel(point, color);
        }
        if self.plot(point, color) {
            color
        } else {
            ColorRef::INVALID
        }
    }

    fn get_pixel(&mut self, next: Next<'_>, point: Point) -> ColorRef {
        match &self.surface {
            Some((_, bitmap)) => bitmap
                .offset(point)
                .map_or(ColorRef::INVALID, |offset| bitmap.pixels()[offset]),
            None => next.get_pixel(point),
        }
    }

    fn get_image(&mut self, next: Next<'_>, rect: Rect) -> Option<Vec<ColorRef>> {
        let Some((_, bitmap)) = &self.surface else {
            return next.get_image(rect);
        };
        let rect = rect.normalized();
        if rect.intersect(&bitmap.rect()) != Some(rect) {
            return None;
        }
        let pixels = bitmap.pixels();
        let mut out = Vec::with_capacity((rect.width() * rect.height()).max(0) as usize);
        for y in rect.top..rect.bottom {
            let start = bitmap.offset(Point::new(rect.left, y))?;
            out.extend_from_slice(&pixels[start..start + rect.width() as usize]);
        }
        Some(out)
    }

    fn get_device_caps(&mut self, next: Next<'_>, cap: DeviceCap) -> i32 {
        match (&self.surface, cap) {
            (Some((_, bitmap)), DeviceCap::HorzRes) => bitmap.width,
            (Some((_, bitmap)), DeviceCap::VertRes) => bitmap.height,
            (Some((_, bitmap)), DeviceCap::BitsPixel) => bitmap.bits_per_pixel,
            _ => next.get_device_caps(cap),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::chain::DeviceChain;

    fn chain_with_surface(width: i32, height: i32) -> (DeviceChain, Bitmap) {
        let bitmap = Bitmap::new(width, height, 32);
        let mut chain = DeviceChain::default();
        chain.push(Box::new(MemoryLayer::new()));
        assert!(chain.head().select_bitmap(Handle::new(50, 1), &bitmap));
        (chain, bitmap)
    }

    #[test]
    fn test_pixels_round_trip() {
        let (mut chain, bitmap) = chain_with_surface(4, 4);
        let red = ColorRef::rgb(255, 0, 0);
        assert_eq!(chain.head().set_pixel(Point::new(2, 1), red), red);
        assert_eq!(chain.head().get_pixel(Point::new(2, 1)), red);
        assert_eq!(bitmap.pixels()[6], red);
        assert_eq!(chain.head().set_pixel(Point::new(9, 9), red), ColorRef::INVALID);
    }

    #[test]
    fn test_pat_blt_uses_brush_and_clips() {
        let (mut chain, bitmap) = chain_with_surface(4, 4);
        let blue = ColorRef::rgb(0, 0, 255);
        chain.head().select_brush(Handle::new(51, 1), &LogBrush::solid(blue));
        assert!(chain.head().pat_blt(Rect::new(2, 2, 10, 10), rop::PATCOPY));

        let image = chain.head().get_image(Rect::new(0, 0, 4, 4)).unwrap();
        assert_eq!(image.iter().filter(|&&c| c == blue).count(), 4);
        assert_eq!(bitmap.pixels()[15], blue);
        assert_eq!(bitmap.pixels()[0], ColorRef::BLACK);
    }

    #[test]
    fn test_line_excludes_end_point() {
        let (mut chain, _bitmap) = chain_with_surface(5, 5);
        let white = ColorRef::WHITE;
        chain
            .head()
            .select_pen(Handle::new(52, 1), &LogPen::new(PenStyle::Solid, 1, white));
        assert!(chain.head().line_to(Point::new(0, 0), Point::new(4, 4)));
        assert_eq!(chain.head().get_pixel(Point::new(3, 3)), white);
        assert_eq!(chain.head().get_pixel(Point::new(4, 4)), ColorRef::BLACK);
    }

    #[test]
    fn test_long_lines_are_clipped_to_the_surface() {
        let (mut chain, bitmap) = chain_with_surface(6, 3);
        let white = ColorRef::WHITE;
        chain
            .head()
            .select_pen(Handle::new(52, 1), &LogPen::new(PenStyle::Solid, 1, white));
        assert!(chain.head().line_to(Point::new(-2_000_000_000, 1), Point::new(2_000_000_000, 1)));
        assert!(chain.head().line_to(Point::new(i32::MAX, i32::MIN), Point::new(i32::MIN, i32::MAX)));
        assert!(chain.head().line_to(Point::new(2, i32::MAX), Point::new(2, i32::MIN)));

        let pixels = bitmap.pixels();
        assert!(pixels[6..12].iter().all(|&c| c == white));
        assert_eq!(pixels[2], white);
        assert_eq!(pixels[14], white);
        assert_eq!(pixels[0], ColorRef::BLACK);
    }

    #[test]
    fn test_rectangle_at_the_edge_of_the_range() {
        let (mut chain, bitmap) = chain_with_surface(3, 3);
        chain
            .head()
            .select_brush(Handle::new(51, 1), &LogBrush::solid(ColorRef::WHITE));
        chain
            .head()
            .select_pen(Handle::new(52, 1), &LogPen::new(PenStyle::Solid, 1, ColorRef::WHITE));
        assert!(chain.head().rectangle(Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX)));
        assert!(bitmap.pixels().iter().all(|&c| c == ColorRef::WHITE));
    }

    #[test]
    fn test_round_div_rounds_half_away_from_zero() {
        assert_eq!(round_div(5, 2), 3);
        assert_eq!(round_div(-5, 2), -3);
        assert_eq!(round_div(4, 3), 1);
        assert_eq!(round_div(-4, 3), -1);
    }

    #[test]
    fn test_caps_follow_surface() {
        let (mut chain, _bitmap) = chain_with_surface(7, 3);
        assert_eq!(chain.head().get_device_caps(DeviceCap::HorzRes), 7);
        assert_eq!(chain.head().get_device_caps(DeviceCap::VertRes), 3);
        assert_eq!(chain.head().get_device_caps(DeviceCap::Planes), 1);
    }

    #[test]
    fn test_deleted_surface_is_forgotten() {
        let (mut chain, _bitmap) = chain_with_surface(2, 2);
        chain.head().delete_object(Handle::new(50, 1));
        assert_eq!(chain.head().get_pixel(Point::new(0, 0)), ColorRef::INVALID);
        assert_eq!(chain.head().get_device_caps(DeviceCap::HorzRes), 640);
    }
}
