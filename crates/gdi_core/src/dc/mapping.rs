//! Mapping mode, window and viewport, world transform and layout

use crate::driver::DeviceCap;
use crate::error::{GdiError, GdiResult};
use crate::foundation::math::{Point, Size, Xform};

use super::modes::{GraphicsMode, Layout, MapMode, TransformKind, WorldModify};
use super::state::DcState;
use super::xform::{combine_transform, fix_isotropic, fixed_extents};

fn scale_extent(extent: i32, num: i32, denom: i32) -> i32 {
    let scaled = i64::from(extent) * i64::from(num) / i64::from(denom);
    match i32::try_from(scaled) {
        Ok(0) => 1,
        Ok(value) => value,
        Err(_) if scaled < 0 => i32::MIN,
        Err(_) => i32::MAX,
    }
}

impl DcState {
    /// Current mapping mode
    pub fn map_mode(&self) -> MapMode {
        MapMode::from_raw(self.attr.map_mode).unwrap_or(MapMode::Text)
    }

    /// Change the mapping mode, returning the previous one
    ///
    /// Fixed modes derive their extents from the device's physical size and
    /// resolution. Under a right-to-left layout the mode stays anisotropic.
    pub fn set_map_mode(&mut self, mode: MapMode) -> MapMode {
        let previous = self.map_mode();
        if mode == previous && !mode.has_fixed_extents() {
            return previous;
        }

        let mut head = |cap| self.chain.head().get_device_caps(cap);
        let size_mm = Size::new(head(DeviceCap::HorzSize), head(DeviceCap::VertSize));
        let resolution = Size::new(head(DeviceCap::HorzRes), head(DeviceCap::VertRes));
        if let Some((window, viewport)) = fixed_extents(mode, size_mm, resolution) {
            self.attr.window_ext = window;
            self.attr.viewport_ext = viewport;
        }
        if !self.layout().contains(Layout::RTL) {
            self.attr.map_mode = mode as u32;
        }
        self.update_xforms();
        previous
    }

    /// Window origin
    pub fn window_org(&self) -> Point {
        self.attr.window_org
    }

    /// Window extent
    pub fn window_ext(&self) -> Size {
        self.attr.window_ext
    }

    /// Viewport origin
    pub fn viewport_org(&self) -> Point {
        self.attr.viewport_org
    }

    /// Viewport extent
    pub fn viewport_ext(&self) -> Size {
        self.attr.viewport_ext
    }

    /// Move the window origin, returning the previous one
    pub fn set_window_org(&mut self, org: Point) -> Point {
        let previous = std::mem::replace(&mut self.attr.window_org, org);
        self.update_xforms();
        previous
    }

    /// Move the viewport origin, returning the previous one
    pub fn set_viewport_org(&mut self, org: Point) -> Point {
        let previous = std::mem::replace(&mut self.attr.viewport_org, org);
        self.update_xforms();
        previous
    }

    /// Shift the window origin, returning the previous one
    pub fn offset_window_org(&mut self, dx: i32, dy: i32) -> Point {
        let org = self.attr.window_org;
        self.set_window_org(Point::new(org.x.saturating_add(dx), org.y.saturating_add(dy)))
    }

    /// Shift the viewport origin, returning the previous one
    pub fn offset_viewport_org(&mut self, dx: i32, dy: i32) -> Point {
        let org = self.attr.viewport_org;
        self.set_viewport_org(Point::new(org.x.saturating_add(dx), org.y.saturating_add(dy)))
    }

    /// Change the window extent, returning the previous one
    ///
    /// Ignored under fixed mapping modes. A zero extent is stored and leaves
    /// the transform without an inverse.
    pub fn set_window_ext(&mut self, ext: Size) -> Size {
        let previous = self.attr.window_ext;
        if self.map_mode().has_fixed_extents() {
            return previous;
        }
        self.attr.window_ext = ext;
        self.fix_isotropic();
        self.update_xforms();
        previous
    }

    /// Change the viewport extent, returning the previous one
    pub fn set_viewport_ext(&mut self, ext: Size) -> Size {
        let previous = self.attr.viewport_ext;
        if self.map_mode().has_fixed_extents() {
            return previous;
        }
        self.attr.viewport_ext = ext;
        self.fix_isotropic();
        self.update_xforms();
        previous
    }

    /// Multiply the window extent by `x_num / x_denom` and `y_num / y_denom`
    pub fn scale_window_ext(&mut self, x_num: i32, x_denom: i32, y_num: i32, y_denom: i32) -> GdiResult<Size> {
        let previous = self.attr.window_ext;
        if self.map_mode().has_fixed_extents() {
            return Ok(previous);
        }
        if x_denom == 0 || y_denom == 0 {
            return Err(GdiError::invalid("zero scale denominator"));
        }
        self.attr.window_ext = Size::new(
            scale_extent(previous.cx, x_num, x_denom),
            scale_extent(previous.cy, y_num, y_denom),
        );
        self.fix_isotropic();
        self.update_xforms();
        Ok(previous)
    }

    /// Multiply the viewport extent by `x_num / x_denom` and `y_num / y_denom`
    pub fn scale_viewport_ext(&mut self, x_num: i32, x_denom: i32, y_num: i32, y_denom: i32) -> GdiResult<Size> {
        let previous = self.attr.viewport_ext;
        if self.map_mode().has_fixed_extents() {
            return Ok(previous);
        }
        if x_denom == 0 || y_denom == 0 {
            return Err(GdiError::invalid("zero scale denominator"));
        }
        self.attr.viewport_ext = Size::new(
            scale_extent(previous.cx, x_num, x_denom),
            scale_extent(previous.cy, y_num, y_denom),
        );
        self.fix_isotropic();
        self.update_xforms();
        Ok(previous)
    }

    fn fix_isotropic(&mut self) {
        if self.map_mode() == MapMode::Isotropic {
            fix_isotropic(self.attr.window_ext, &mut self.attr.viewport_ext);
        }
    }

    /// Current graphics mode
    pub fn graphics_mode(&self) -> GraphicsMode {
        GraphicsMode::from_raw(self.attr.graphics_mode).unwrap_or(GraphicsMode::Compatible)
    }

    /// Change the graphics mode, returning the previous one
    ///
    /// Font realization depends on the mode, so the font is selected again.
    pub fn set_graphics_mode(&mut self, mode: GraphicsMode) -> GraphicsMode {
        let previous = self.graphics_mode();
        if mode != previous {
            self.attr.graphics_mode = mode as u32;
            let font = self.selection().font.clone();
            self.chain.head().select_font(font.handle, &font.object);
        }
        previous
    }

    /// Current layout
    pub fn layout(&self) -> Layout {
        Layout::from_bits_truncate(self.attr.layout)
    }

    /// Change the layout, returning the previous one
    ///
    /// Switching to right-to-left forces the anisotropic mapping mode.
    pub fn set_layout(&mut self, layout: Layout) -> GdiResult<Layout> {
        let stored = self.chain.head().set_layout(layout.bits());
        if stored == u32::MAX {
            return Err(GdiError::Unsupported("layout"));
        }
        let previous = self.layout();
        self.attr.layout = stored;
        if stored != previous.bits() {
            if self.layout().contains(Layout::RTL) {
                self.attr.map_mode = MapMode::Anisotropic as u32;
            }
            self.update_xforms();
        }
        Ok(previous)
    }

    /// Current world transform
    pub fn world_transform(&self) -> Xform {
        self.transforms.world
    }

    /// Replace the world transform
    ///
    /// Needs the advanced graphics mode and an invertible transform.
    pub fn set_world_transform(&mut self, xform: &Xform) -> GdiResult<()> {
        if self.graphics_mode() != GraphicsMode::Advanced {
            return Err(GdiError::invalid("world transforms need the advanced graphics mode"));
        }
        if !xform.is_finite() || xform.determinant().abs() < self.epsilon {
            return Err(GdiError::SingularTransform);
        }
        self.transforms.world = *xform;
        self.update_xforms();
        Ok(())
    }

    /// Reset or extend the world transform
    ///
    /// `xform` is ignored for [`WorldModify::Identity`].
    pub fn modify_world_transform(&mut self, xform: &Xform, mode: WorldModify) -> GdiResult<()> {
        if self.graphics_mode() != GraphicsMode::Advanced {
            return Err(GdiError::invalid("world transforms need the advanced graphics mode"));
        }
        let world = self.transforms.world;
        self.transforms.world = match mode {
            WorldModify::Identity => Xform::IDENTITY,
            WorldModify::LeftMultiply => combine_transform(xform, &world),
            WorldModify::RightMultiply => combine_transform(&world, xform),
        };
        self.update_xforms();
        Ok(())
    }

    /// One of the cached transforms
    pub fn get_transform(&self, kind: TransformKind) -> GdiResult<Xform> {
        match kind {
            TransformKind::WorldToPage => Ok(self.transforms.world),
            TransformKind::PageToDevice => Ok(self.transforms.window_to_viewport),
            TransformKind::WorldToDevice => Ok(self.transforms.world_to_device),
            TransformKind::DeviceToWorld => self.transforms.device_to_world.ok_or(GdiError::SingularTransform),
        }
    }

    /// Map logical points to device points
    pub fn lp_to_dp(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|p| self.transforms.lp_to_dp(*p)).collect()
    }

    /// Map device points to logical points
    pub fn dp_to_lp(&self, points: &[Point]) -> GdiResult<Vec<Point>> {
        points
            .iter()
            .map(|p| self.transforms.dp_to_lp(*p).ok_or(GdiError::SingularTransform))
            .collect()
    }
}
