//! Coordinate spaces, clipping, paths and bounds

use crate::dc::modes::{BoundsFlags, BoundsState, GraphicsMode, Layout, MapMode, TransformKind, WorldModify};
use crate::dc::path::{Path, PathVertex};
use crate::error::{GdiError, GdiResult};
use crate::foundation::math::{Point, Rect, Size, Xform};
use crate::handle::Handle;
use crate::object::{ObjectBody, Region};

use super::{fetch, Gdi};

impl Gdi {
    // --- mapping mode, window and viewport

    /// Mapping mode
    pub fn get_map_mode(&self, hdc: Handle) -> GdiResult<MapMode> {
        self.with_dc(hdc, |state| Ok(state.map_mode()))
    }

    /// Set the mapping mode, returning the previous one
    pub fn set_map_mode(&self, hdc: Handle, mode: MapMode) -> GdiResult<MapMode> {
        self.with_dc(hdc, |state| Ok(state.set_map_mode(mode)))
    }

    /// Window origin
    pub fn get_window_org(&self, hdc: Handle) -> GdiResult<Point> {
        self.with_dc(hdc, |state| Ok(state.window_org()))
    }

    /// Set the window origin, returning the previous one
    pub fn set_window_org(&self, hdc: Handle, org: Point) -> GdiResult<Point> {
        self.with_dc(hdc, |state| Ok(state.set_window_org(org)))
    }

    /// Move the window origin, returning the previous one
    pub fn offset_window_org(&self, hdc: Handle, dx: i32, dy: i32) -> GdiResult<Point> {
        self.with_dc(hdc, |state| Ok(state.offset_window_org(dx, dy)))
    }

    /// Window extent
    pub fn get_window_ext(&self, hdc: Handle) -> GdiResult<Size> {
        self.with_dc(hdc, |state| Ok(state.window_ext()))
    }

    /// Set the window extent, returning the previous one
    ///
    /// Ignored outside the isotropic and anisotropic modes.
    pub fn set_window_ext(&self, hdc: Handle, ext: Size) -> GdiResult<Size> {
        self.with_dc(hdc, |state| Ok(state.set_window_ext(ext)))
    }

    /// Scale the window extent by two ratios, returning the previous extent
    pub fn scale_window_ext(
        &self,
        hdc: Handle,
        x_num: i32,
        x_denom: i32,
        y_num: i32,
        y_denom: i32,
    ) -> GdiResult<Size> {
        self.with_dc(hdc, |state| state.scale_window_ext(x_num, x_denom, y_num, y_denom))
    }

    /// Viewport origin
    pub fn get_viewport_org(&self, hdc: Handle) -> GdiResult<Point> {
        self.with_dc(hdc, |state| Ok(state.viewport_org()))
    }

    /// Set the viewport origin, returning the previous one
    pub fn set_viewport_org(&self, hdc: Handle, org: Point) -> GdiResult<Point> {
        self.with_dc(hdc, |state| Ok(state.set_viewport_org(org)))
    }

    /// Move the viewport origin, returning the previous one
    pub fn offset_viewport_org(&self, hdc: Handle, dx: i32, dy: i32) -> GdiResult<Point> {
        self.with_dc(hdc, |state| Ok(state.offset_viewport_org(dx, dy)))
    }

    /// Viewport extent
    pub fn get_viewport_ext(&self, hdc: Handle) -> GdiResult<Size> {
        self.with_dc(hdc, |state| Ok(state.viewport_ext()))
    }

    /// Set the viewport extent, returning the previous one
    ///
    /// Ignored outside the isotropic and anisotropic modes.
    pub fn set_viewport_ext(&self, hdc: Handle, ext: Size) -> GdiResult<Size> {
        self.with_dc(hdc, |state| Ok(state.set_viewport_ext(ext)))
    }

    /// Scale the viewport extent by two ratios, returning the previous extent
    pub fn scale_viewport_ext(
        &self,
        hdc: Handle,
        x_num: i32,
        x_denom: i32,
        y_num: i32,
        y_denom: i32,
    ) -> GdiResult<Size> {
        self.with_dc(hdc, |state| state.scale_viewport_ext(x_num, x_denom, y_num, y_denom))
    }

    /// Graphics mode
    pub fn get_graphics_mode(&self, hdc: Handle) -> GdiResult<GraphicsMode> {
        self.with_dc(hdc, |state| Ok(state.graphics_mode()))
    }

    /// Set the graphics mode, returning the previous one
    pub fn set_graphics_mode(&self, hdc: Handle, mode: GraphicsMode) -> GdiResult<GraphicsMode> {
        self.with_dc(hdc, |state| Ok(state.set_graphics_mode(mode)))
    }

    /// Layout flags
    pub fn get_layout(&self, hdc: Handle) -> GdiResult<Layout> {
        self.with_dc(hdc, |state| Ok(state.layout()))
    }

    /// Set the layout, returning the previous flags
    pub fn set_layout(&self, hdc: Handle, layout: Layout) -> GdiResult<Layout> {
        self.with_dc(hdc, |state| state.set_layout(layout))
    }

    // --- world transform

    /// World transform
    pub fn get_world_transform(&self, hdc: Handle) -> GdiResult<Xform> {
        self.with_dc(hdc, |state| Ok(state.world_transform()))
    }

    /// Replace the world transform; needs the advanced graphics mode
    pub fn set_world_transform(&self, hdc: Handle, xform: &Xform) -> GdiResult<()> {
        self.with_dc(hdc, |state| state.set_world_transform(xform))
    }

    /// Reset or combine the world transform; needs the advanced graphics mode
    pub fn modify_world_transform(&self, hdc: Handle, xform: &Xform, mode: WorldModify) -> GdiResult<()> {
        self.with_dc(hdc, |state| state.modify_world_transform(xform, mode))
    }

    /// One of the cached transforms
    pub fn get_transform(&self, hdc: Handle, kind: TransformKind) -> GdiResult<Xform> {
        self.with_dc(hdc, |state| state.get_transform(kind))
    }

    /// Map logical points to device points
    pub fn lp_to_dp(&self, hdc: Handle, points: &[Point]) -> GdiResult<Vec<Point>> {
        self.with_dc(hdc, |state| Ok(state.lp_to_dp(points)))
    }

    /// Map device points to logical points
    ///
    /// Fails with [`GdiError::SingularTransform`] when the mapping cannot be inverted.
    pub fn dp_to_lp(&self, hdc: Handle, points: &[Point]) -> GdiResult<Vec<Point>> {
        self.with_dc(hdc, |state| state.dp_to_lp(points))
    }

    // --- clipping

    /// Replace the clip region with a copy of a region object, or remove it
    pub fn select_clip_region(&self, hdc: Handle, region: Option<Handle>) -> GdiResult<()> {
        let region = match region {
            Some(handle) => Some(fetch(&self.table.lock(), handle, "region", |body| match body {
                ObjectBody::Region(region) => Some(region.clone()),
                _ => None,
            })?),
            None => None,
        };
        self.with_dc(hdc, |state| {
            state.select_clip_region(region.as_ref());
            Ok(())
        })
    }

    /// Narrow the clip region to a logical rectangle
    ///
    /// Returns whether anything remains drawable.
    pub fn intersect_clip_rect(&self, hdc: Handle, rect: Rect) -> GdiResult<bool> {
        self.with_dc(hdc, |state| Ok(state.intersect_clip_rect(&rect)))
    }

    /// Fold the clip region into the meta region
    pub fn set_meta_region(&self, hdc: Handle) -> GdiResult<()> {
        self.with_dc(hdc, |state| {
            state.set_meta_region();
            Ok(())
        })
    }

    /// Copy of the application clip region in device units
    pub fn get_clip_region(&self, hdc: Handle) -> GdiResult<Option<Region>> {
        self.with_dc(hdc, |state| Ok(state.clip_region().cloned()))
    }

    /// Bounding box of the drawable area in logical units
    pub fn get_clip_box(&self, hdc: Handle) -> GdiResult<Rect> {
        self.with_dc(hdc, |state| state.clip_box())
    }

    // --- paths

    /// Start recording a path, discarding any previous one
    pub fn begin_path(&self, hdc: Handle) -> GdiResult<()> {
        self.with_dc(hdc, |state| {
            *state.path_mut() = Some(Path::open());
            Ok(())
        })
    }

    /// Stop recording
    pub fn end_path(&self, hdc: Handle) -> GdiResult<()> {
        self.with_dc(hdc, |state| match state.path_mut() {
            Some(path) => path.end(),
            None => Err(GdiError::invalid("no open path")),
        })
    }

    /// Discard the path
    pub fn abort_path(&self, hdc: Handle) -> GdiResult<()> {
        self.with_dc(hdc, |state| {
            *state.path_mut() = None;
            Ok(())
        })
    }

    /// Close the current figure of the open path
    pub fn close_figure(&self, hdc: Handle) -> GdiResult<()> {
        self.with_dc(hdc, |state| match state.path_mut() {
            Some(path) => path.close_figure(),
            None => Err(GdiError::invalid("no open path")),
        })
    }

    /// Vertices of an ended path in logical units
    pub fn get_path(&self, hdc: Handle) -> GdiResult<Vec<(Point, PathVertex)>> {
        self.with_dc(hdc, |state| {
            let path = state
                .path()
                .filter(|path| !path.is_open())
                .ok_or_else(|| GdiError::invalid("no ended path"))?;
            path.points()
                .iter()
                .map(|(point, vertex)| {
                    state
                        .transforms()
                        .dp_to_lp(*point)
                        .map(|logical| (logical, *vertex))
                        .ok_or(GdiError::SingularTransform)
                })
                .collect()
        })
    }

    // --- bounds

    /// Control bounds accumulation, returning the state before the call
    pub fn set_bounds_rect(&self, hdc: Handle, rect: Option<Rect>, flags: BoundsFlags) -> GdiResult<BoundsState> {
        self.with_dc(hdc, |state| state.set_bounds_rect(rect.as_ref(), flags))
    }

    /// Accumulated bounds in logical units
    pub fn get_bounds_rect(&self, hdc: Handle, flags: BoundsFlags) -> GdiResult<(Rect, BoundsState)> {
        self.with_dc(hdc, |state| state.bounds_rect(flags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GdiConfig;

    fn gdi_with_dc() -> (Gdi, Handle) {
        let gdi = Gdi::new(GdiConfig::default()).unwrap();
        let hdc = gdi.create_dc("DISPLAY").unwrap();
        (gdi, hdc)
    }

    #[test]
    fn test_anisotropic_mapping() {
        let (gdi, hdc) = gdi_with_dc();
        gdi.set_map_mode(hdc, MapMode::Anisotropic).unwrap();
        gdi.set_window_ext(hdc, Size::new(100, 100)).unwrap();
        gdi.set_viewport_ext(hdc, Size::new(200, 50)).unwrap();
        gdi.set_viewport_org(hdc, Point::new(10, 10)).unwrap();
        let device = gdi.lp_to_dp(hdc, &[Point::new(50, 50)]).unwrap();
        assert_eq!(device, vec![Point::new(110, 35)]);
        assert_eq!(gdi.dp_to_lp(hdc, &device).unwrap(), vec![Point::new(50, 50)]);
        gdi.delete_dc(hdc).unwrap();
    }

    #[test]
    fn test_text_mode_ignores_extents() {
        let (gdi, hdc) = gdi_with_dc();
        assert_eq!(gdi.set_window_ext(hdc, Size::new(7, 7)).unwrap(), Size::new(1, 1));
        assert_eq!(gdi.get_window_ext(hdc).unwrap(), Size::new(1, 1));
        gdi.delete_dc(hdc).unwrap();
    }

    #[test]
    fn test_world_transform_needs_advanced_mode() {
        let (gdi, hdc) = gdi_with_dc();
        let scale = Xform::scale_translate(2.0, 2.0, 0.0, 0.0);
        assert!(gdi.set_world_transform(hdc, &scale).is_err());
        gdi.set_graphics_mode(hdc, GraphicsMode::Advanced).unwrap();
        gdi.set_world_transform(hdc, &scale).unwrap();
        assert_eq!(gdi.lp_to_dp(hdc, &[Point::new(3, 4)]).unwrap(), vec![Point::new(6, 8)]);
        assert!(matches!(
            gdi.set_world_transform(hdc, &Xform::scale_translate(0.0, 1.0, 0.0, 0.0)),
            Err(GdiError::SingularTransform)
        ));
        gdi.modify_world_transform(hdc, &Xform::IDENTITY, WorldModify::Identity)
            .unwrap();
        assert_eq!(gdi.get_world_transform(hdc).unwrap(), Xform::IDENTITY);
        gdi.delete_dc(hdc).unwrap();
    }

    #[test]
    fn test_select_clip_region_copies() {
        let (gdi, hdc) = gdi_with_dc();
        let region = gdi.create_rect_region(Rect::new(5, 5, 15, 25)).unwrap();
        gdi.select_clip_region(hdc, Some(region)).unwrap();
        gdi.delete_object(region).unwrap();
        assert_eq!(gdi.get_clip_box(hdc).unwrap(), Rect::new(5, 5, 15, 25));
        gdi.select_clip_region(hdc, None).unwrap();
        assert!(gdi.get_clip_region(hdc).unwrap().is_none());
        assert_eq!(gdi.get_clip_box(hdc).unwrap(), Rect::new(0, 0, 1024, 768));
        gdi.delete_dc(hdc).unwrap();
    }

    #[test]
    fn test_path_lifecycle() {
        let (gdi, hdc) = gdi_with_dc();
        assert!(gdi.end_path(hdc).is_err());
        gdi.begin_path(hdc).unwrap();
        assert!(gdi.get_path(hdc).is_err());
        gdi.end_path(hdc).unwrap();
        assert!(gdi.get_path(hdc).unwrap().is_empty());
        assert!(gdi.close_figure(hdc).is_err());
        gdi.abort_path(hdc).unwrap();
        assert!(gdi.get_path(hdc).is_err());
        gdi.delete_dc(hdc).unwrap();
    }
}
