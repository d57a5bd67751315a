//! Clip regions and bounds accumulation
//!
//! Regions are kept in device units. The effective clip is the visible area
//! intersected with the meta region and the clip region, whichever are set.

use crate::error::{GdiError, GdiResult};
use crate::foundation::math::Rect;
use crate::object::Region;

use super::modes::{BoundsFlags, BoundsState};
use super::state::DcState;

impl DcState {
    /// Application clip region
    pub fn clip_region(&self) -> Option<&Region> {
        self.clip.as_ref()
    }

    /// Meta region
    pub fn meta_region(&self) -> Option<&Region> {
        self.meta.as_ref()
    }

    /// Replace the clip region with a copy of `region`, or remove it
    pub fn select_clip_region(&mut self, region: Option<&Region>) {
        self.clip = region.cloned();
    }

    /// Narrow the clip region to a logical rectangle
    ///
    /// Returns whether anything remains drawable.
    pub fn intersect_clip_rect(&mut self, rect: &Rect) -> bool {
        let device = self.transforms.rect_to_device(rect);
        let clip = match self.clip.take() {
            Some(clip) => clip.intersect_rect(&device),
            None => Region::from_rect(device),
        };
        self.clip = Some(clip);
        !self.effective_clip().is_empty()
    }

    /// Fold the clip region into the meta region and clear it
    pub fn set_meta_region(&mut self) {
        if let Some(clip) = self.clip.take() {
            self.meta = Some(match self.meta.take() {
                Some(meta) => meta.intersect(&clip),
                None => clip,
            });
        }
    }

    /// Area drawing may touch, in device units
    pub fn effective_clip(&self) -> Region {
        let mut region = Region::from_rect(self.vis_rect);
        if let Some(meta) = &self.meta {
            region = region.intersect(meta);
        }
        if let Some(clip) = &self.clip {
            region = region.intersect(clip);
        }
        region
    }

    /// Bounding box of the effective clip in logical units
    pub fn clip_box(&self) -> GdiResult<Rect> {
        let region = self.effective_clip();
        if region.is_empty() {
            return Ok(Rect::default());
        }
        self.transforms
            .rect_to_logical(&region.bounding_box())
            .ok_or(GdiError::SingularTransform)
    }

    fn bounds_state(&self) -> BoundsState {
        BoundsState {
            dirty: !self.bounds.is_empty(),
            enabled: self.bounds_enabled,
        }
    }

    /// Control bounds accumulation, returning the state before the call
    ///
    /// `rect` is logical and only used with [`BoundsFlags::ACCUMULATE`].
    pub fn set_bounds_rect(&mut self, rect: Option<&Rect>, flags: BoundsFlags) -> GdiResult<BoundsState> {
        if flags.contains(BoundsFlags::ENABLE | BoundsFlags::DISABLE) {
            return Err(GdiError::invalid("bounds cannot be enabled and disabled at once"));
        }
        let previous = self.bounds_state();
        if flags.contains(BoundsFlags::RESET) {
            self.bounds = Rect::EMPTY;
        }
        if let Some(rect) = rect.filter(|_| flags.contains(BoundsFlags::ACCUMULATE)) {
            let device = self.transforms.rect_to_device(rect);
            self.bounds = self.bounds.union(&device);
        }
        if flags.contains(BoundsFlags::ENABLE) {
            self.bounds_enabled = true;
        }
        if flags.contains(BoundsFlags::DISABLE) {
            self.bounds_enabled = false;
        }
        Ok(previous)
    }

    /// Accumulated bounds in logical units, cleared afterwards with [`BoundsFlags::RESET`]
    pub fn bounds_rect(&mut self, flags: BoundsFlags) -> GdiResult<(Rect, BoundsState)> {
        let state = self.bounds_state();
        let rect = if state.dirty {
            let visible = self.bounds.intersect(&self.vis_rect).unwrap_or_default();
            self.transforms
                .rect_to_logical(&visible)
                .ok_or(GdiError::SingularTransform)?
        } else {
            Rect::default()
        };
        if flags.contains(BoundsFlags::RESET) {
            self.bounds = Rect::EMPTY;
        }
        Ok((rect, state))
    }

    /// Merge a device rectangle touched by drawing
    pub fn accumulate_bounds(&mut self, device: &Rect) {
        if self.bounds_enabled {
            self.bounds = self.bounds.union(&device.normalized());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::AttributeArena;
    use crate::config::ArenaConfig;
    use crate::dc::modes::MapMode;
    use crate::dc::state::{DcStock, Selected, Selection};
    use crate::driver::DeviceChain;
    use crate::foundation::color::ColorRef;
    use crate::foundation::math::{Point, Size};
    use crate::foundation::sync::CheckedMutex;
    use crate::handle::{Handle, ObjectType};
    use crate::object::{LogBrush, LogFont, LogPen, PenStyle};

    fn state() -> DcState {
        let arena = CheckedMutex::new("arena", AttributeArena::new(&ArenaConfig::default()));
        let block = arena.lock().alloc().unwrap();
        let selection = Selection {
            pen: Selected::new(Handle::new(40, 1), LogPen::new(PenStyle::Solid, 1, ColorRef::BLACK)),
            brush: Selected::new(Handle::new(41, 1), LogBrush::solid(ColorRef::WHITE)),
            font: Selected::new(Handle::new(42, 1), LogFont::default()),
            palette: Handle::new(43, 1),
            bitmap: None,
        };
        let stock = DcStock {
            brush: Handle::new(44, 1),
            pen: Handle::new(45, 1),
        };
        DcState::new(
            ObjectType::Dc,
            block,
            selection,
            stock,
            Rect::new(0, 0, 100, 100),
            DeviceChain::default(),
            1e-12,
        )
    }

    #[test]
    fn test_clip_box_defaults_to_visible_area() {
        let state = state();
        assert_eq!(state.clip_box().unwrap(), Rect::new(0, 0, 100, 100));
    }

    #[test]
    fn test_intersect_and_meta() {
        let mut state = state();
        assert!(state.intersect_clip_rect(&Rect::new(10, 10, 50, 50)));
        assert!(state.intersect_clip_rect(&Rect::new(30, 30, 80, 80)));
        assert_eq!(state.clip_box().unwrap(), Rect::new(30, 30, 50, 50));

        state.set_meta_region();
        assert!(state.clip_region().is_none());
        assert_eq!(state.clip_box().unwrap(), Rect::new(30, 30, 50, 50));

        assert!(!state.intersect_clip_rect(&Rect::new(60, 60, 70, 70)));
        assert_eq!(state.clip_box().unwrap(), Rect::default());
    }

    #[test]
    fn test_clip_rect_is_mapped_to_device() {
        let mut state = state();
        state.set_map_mode(MapMode::Anisotropic);
        state.set_viewport_ext(Size::new(2, 2));
        state.intersect_clip_rect(&Rect::new(0, 0, 10, 10));
        assert_eq!(state.clip_region().unwrap().bounding_box(), Rect::new(0, 0, 20, 20));
        assert_eq!(state.clip_box().unwrap(), Rect::new(0, 0, 10, 10));
    }

    #[test]
    fn test_bounds_accumulation() {
        let mut state = state();
        state.accumulate_bounds(&Rect::new(1, 1, 2, 2));
        let (_, before) = state.bounds_rect(BoundsFlags::empty()).unwrap();
        assert!(!before.dirty);

        state.set_bounds_rect(None, BoundsFlags::ENABLE).unwrap();
        state.accumulate_bounds(&Rect::new(5, 5, 6, 6));
        state.accumulate_bounds(&Rect::new(10, 2, 12, 3));
        let (rect, bounds) = state.bounds_rect(BoundsFlags::RESET).unwrap();
        assert!(bounds.dirty && bounds.enabled);
        assert_eq!(rect, Rect::new(5, 2, 12, 6));

        let (rect, bounds) = state.bounds_rect(BoundsFlags::empty()).unwrap();
        assert!(!bounds.dirty);
        assert_eq!(rect, Rect::default());

        let accumulate = Rect::new(0, 0, 3, 3);
        state
            .set_bounds_rect(Some(&accumulate), BoundsFlags::ACCUMULATE | BoundsFlags::DISABLE)
            .unwrap();
        let (rect, bounds) = state.bounds_rect(BoundsFlags::empty()).unwrap();
        assert!(!bounds.enabled);
        assert_eq!(rect, accumulate);
        assert!(state.set_bounds_rect(None, BoundsFlags::ENABLE | BoundsFlags::DISABLE).is_err());
        assert_eq!(state.lp_to_dp(&[Point::new(1, 1)]), vec![Point::new(1, 1)]);
    }
}
