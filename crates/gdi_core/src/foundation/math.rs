//! Math utilities and types
//!
//! Integer device geometry (points, sizes, rectangles) plus the 2-D affine
//! transform used by the mapping-mode pipeline. Transforms are backed by
//! nalgebra homogeneous matrices.

pub use nalgebra::{Matrix3, Point2};

/// Floating point 2D point used by transform math
pub type Point2d = Point2<f64>;

/// Default threshold below which a determinant is treated as singular
pub const DEFAULT_SINGULAR_EPSILON: f64 = 1e-12;

/// Integer point in logical or device space
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    /// Horizontal coordinate
    pub x: i32,
    /// Vertical coordinate
    pub y: i32,
}

unsafe impl bytemuck::Pod for Point {}
unsafe impl bytemuck::Zeroable for Point {}

impl Point {
    /// Create a new point
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Integer extent
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Size {
    /// Horizontal extent
    pub cx: i32,
    /// Vertical extent
    pub cy: i32,
}

unsafe impl bytemuck::Pod for Size {}
unsafe impl bytemuck::Zeroable for Size {}

impl Size {
    /// Create a new extent
    pub const fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }

    /// Zero extent
    pub const ZERO: Self = Self { cx: 0, cy: 0 };
}

/// Integer rectangle, right/bottom exclusive
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left edge
    pub left: i32,
    /// Top edge
    pub top: i32,
    /// Right edge (exclusive)
    pub right: i32,
    /// Bottom edge (exclusive)
    pub bottom: i32,
}

impl Rect {
    /// Create a new rectangle
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// The empty accumulator used for bounds tracking
    pub const EMPTY: Self = Self {
        left: i32::MAX,
        top: i32::MAX,
        right: i32::MIN,
        bottom: i32::MIN,
    };

    /// Width of the rectangle, saturating at the i32 range
    pub const fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    /// Height of the rectangle, saturating at the i32 range
    pub const fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Whether the rectangle encloses no area
    pub const fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Return a copy with left <= right and top <= bottom
    pub fn normalized(&self) -> Self {
        Self {
            left: self.left.min(self.right),
            top: self.top.min(self.bottom),
            right: self.left.max(self.right),
            bottom: self.top.max(self.bottom),
        }
    }

    /// Intersection of two rectangles, `None` when they do not overlap
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let rect = Self {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        };
        (!rect.is_empty()).then_some(rect)
    }

    /// Smallest rectangle containing both; empty operands are ignored
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Translate by the given offsets, saturating at the i32 range
    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            left: self.left.saturating_add(dx),
            top: self.top.saturating_add(dy),
            right: self.right.saturating_add(dx),
            bottom: self.bottom.saturating_add(dy),
        }
    }

    /// Whether the point lies inside the rectangle
    pub const fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }
}

/// 2D affine transform in GDI `XFORM` convention
///
/// A point maps as `x' = x*m11 + y*m21 + dx`, `y' = x*m12 + y*m22 + dy`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xform {
    /// Row 1, column 1
    pub m11: f64,
    /// Row 1, column 2
    pub m12: f64,
    /// Row 2, column 1
    pub m21: f64,
    /// Row 2, column 2
    pub m22: f64,
    /// Horizontal translation
    pub dx: f64,
    /// Vertical translation
    pub dy: f64,
}

impl Default for Xform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Xform {
    /// The identity transform
    pub const IDENTITY: Self = Self {
        m11: 1.0,
        m12: 0.0,
        m21: 0.0,
        m22: 1.0,
        dx: 0.0,
        dy: 0.0,
    };

    /// Create a transform from its six coefficients
    pub const fn new(m11: f64, m12: f64, m21: f64, m22: f64, dx: f64, dy: f64) -> Self {
        Self { m11, m12, m21, m22, dx, dy }
    }

    /// Axis-aligned scale followed by a translation
    pub const fn scale_translate(sx: f64, sy: f64, dx: f64, dy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, dx, dy)
    }

    /// Convert to a homogeneous column-vector matrix
    pub fn to_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.m11, self.m21, self.dx,
            self.m12, self.m22, self.dy,
            0.0, 0.0, 1.0,
        )
    }

    /// Build from a homogeneous column-vector matrix (projective row ignored)
    pub fn from_matrix(matrix: &Matrix3<f64>) -> Self {
        Self {
            m11: matrix[(0, 0)],
            m12: matrix[(1, 0)],
            m21: matrix[(0, 1)],
            m22: matrix[(1, 1)],
            dx: matrix[(0, 2)],
            dy: matrix[(1, 2)],
        }
    }

    /// Transform that applies `self` first and then `then`
    pub fn then(&self, then: &Self) -> Self {
        Self::from_matrix(&(then.to_matrix() * self.to_matrix()))
    }

    /// Determinant of the linear part
    pub fn determinant(&self) -> f64 {
        self.m11 * self.m22 - self.m12 * self.m21
    }

    /// Inverse transform, or `None` if the determinant lies within `epsilon` of zero
    pub fn invert(&self, epsilon: f64) -> Option<Self> {
        let determinant = self.determinant();
        if determinant.abs() < epsilon {
            return None;
        }
        self.to_matrix().try_inverse().map(|inv| Self::from_matrix(&inv))
    }

    /// Whether the 2x2 linear parts are bit-for-bit equal
    pub fn linear_eq(&self, other: &Self) -> bool {
        self.m11.to_bits() == other.m11.to_bits()
            && self.m12.to_bits() == other.m12.to_bits()
            && self.m21.to_bits() == other.m21.to_bits()
            && self.m22.to_bits() == other.m22.to_bits()
    }

    /// Apply to a floating point location
    pub fn transform_point(&self, point: Point2d) -> Point2d {
        self.to_matrix().transform_point(&point)
    }

    /// Apply to an integer point, rounding to nearest
    pub fn transform_int(&self, point: Point) -> Point {
        let out = self.transform_point(Point2d::new(f64::from(point.x), f64::from(point.y)));
        Point::new(round_to_i32(out.x), round_to_i32(out.y))
    }

    /// Whether every coefficient is finite
    pub fn is_finite(&self) -> bool {
        [self.m11, self.m12, self.m21, self.m22, self.dx, self.dy]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Round half away from zero and saturate into the i32 range
pub fn round_to_i32(value: f64) -> i32 {
    let rounded = value.round();
    if rounded >= f64::from(i32::MAX) {
        i32::MAX
    } else if rounded <= f64::from(i32::MIN) {
        i32::MIN
    } else {
        rounded as i32
    }
}

/// Integer `value * numerator / denominator` with 64-bit intermediate and rounding
pub fn mul_div(value: i32, numerator: i32, denominator: i32) -> i32 {
    if denominator == 0 {
        return -1;
    }
    let product = i64::from(value) * i64::from(numerator);
    let den = i64::from(denominator);
    let half = den.abs() / 2;
    let result = if (product < 0) == (den < 0) {
        (product.abs() + half) / den.abs()
    } else {
        -((product.abs() + half) / den.abs())
    };
    result.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_then_matches_gdi_combine_order() {
        let scale = Xform::scale_translate(2.0, 3.0, 0.0, 0.0);
        let shift = Xform::scale_translate(1.0, 1.0, 10.0, -5.0);

        // scale first, then shift
        let combined = scale.then(&shift);
        let p = combined.transform_point(Point2d::new(1.0, 1.0));
        assert_relative_eq!(p.x, 12.0, epsilon = EPSILON);
        assert_relative_eq!(p.y, -2.0, epsilon = EPSILON);
    }

    #[test]
    fn test_invert_round_trip() {
        let xform = Xform::new(2.0, 0.5, -1.0, 4.0, 7.0, -3.0);
        let inverse = xform.invert(DEFAULT_SINGULAR_EPSILON).unwrap();
        let p = Point2d::new(13.25, -8.5);
        let back = inverse.transform_point(xform.transform_point(p));
        assert_relative_eq!(back.x, p.x, epsilon = EPSILON);
        assert_relative_eq!(back.y, p.y, epsilon = EPSILON);
    }

    #[test]
    fn test_invert_singular() {
        let degenerate = Xform::scale_translate(0.0, 1.0, 5.0, 5.0);
        assert!(degenerate.invert(DEFAULT_SINGULAR_EPSILON).is_none());

        let nearly = Xform::scale_translate(1e-14, 1.0, 0.0, 0.0);
        assert!(nearly.invert(DEFAULT_SINGULAR_EPSILON).is_none());
    }

    #[test]
    fn test_linear_eq_ignores_translation() {
        let a = Xform::scale_translate(2.0, 2.0, 0.0, 0.0);
        let b = Xform::scale_translate(2.0, 2.0, 40.0, 40.0);
        assert!(a.linear_eq(&b));
        assert!(!a.linear_eq(&Xform::IDENTITY));
    }

    #[test]
    fn test_rect_ops() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 20, 20);
        assert_eq!(a.intersect(&b), Some(Rect::new(5, 5, 10, 10)));
        assert_eq!(a.union(&b), Rect::new(0, 0, 20, 20));
        assert_eq!(Rect::EMPTY.union(&a), a);
        assert!(a.intersect(&Rect::new(10, 10, 12, 12)).is_none());
        assert_eq!(Rect::new(10, 10, 0, 0).normalized(), a);
    }

    #[test]
    fn test_mul_div_rounds() {
        assert_eq!(mul_div(640, 254, 960), 169);
        assert_eq!(mul_div(-5, 1, 2), -3);
        assert_eq!(mul_div(1, 1, 0), -1);
    }
}
