//! Ordered layer list owned by a device context

use super::layer::{DeviceLayer, Next};
use super::null::NullLayer;

/// Layers of one device context, outermost first
///
/// Built around a [`NullLayer`] that can never be removed, so the innermost
/// entry is always the null layer.
pub struct DeviceChain {
    layers: Vec<Box<dyn DeviceLayer>>,
}

impl std::fmt::Debug for DeviceChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl Default for DeviceChain {
    fn default() -> Self {
        Self::new(NullLayer::default())
    }
}

impl DeviceChain {
    /// Chain holding only `null`
    pub fn new(null: NullLayer) -> Self {
        Self {
            layers: vec![Box::new(null)],
        }
    }

    /// Add a layer on the outside
    pub fn push(&mut self, layer: Box<dyn DeviceLayer>) {
        log::trace!("Pushing {} layer", layer.name());
        self.layers.insert(0, layer);
    }

    /// Remove the outermost layer; the null layer stays
    pub fn pop(&mut self) -> Option<Box<dyn DeviceLayer>> {
        (self.layers.len() > 1).then(|| self.layers.remove(0))
    }

    /// Number of layers including the null layer
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the chain has no layers, which a constructed chain never does
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer names, outermost first
    pub fn names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|layer| layer.name()).collect()
    }

    /// Cursor at the outermost layer
    pub fn head(&mut self) -> Next<'_> {
        Next::new(&mut self.layers)
    }

    /// Remove every layer above the null layer, outermost first
    pub fn teardown(&mut self) {
        while let Some(mut layer) = self.pop() {
            log::trace!("Deleting {} layer", layer.name());
            layer.delete_dc();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::caps::{DeviceCap, DeviceCaps};
    use crate::driver::gamma::GammaRamp;
    use crate::foundation::color::ColorRef;
    use crate::foundation::math::{Point, Rect};
    use crate::handle::Handle;
    use crate::object::{Bitmap, LogBrush, LogFont, LogPen, PenStyle};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Pass;

    impl DeviceLayer for Pass {
        fn name(&self) -> &'static str {
            "pass"
        }
    }

    struct FixedCaps(i32);

    impl DeviceLayer for FixedCaps {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn get_device_caps(&mut self, next: Next<'_>, cap: DeviceCap) -> i32 {
            match cap {
                DeviceCap::Planes => self.0,
                other => next.get_device_caps(other),
            }
        }
    }

    struct Dropped(Arc<AtomicUsize>);

    impl DeviceLayer for Dropped {
        fn name(&self) -> &'static str {
            "dropped"
        }

        fn delete_dc(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_outermost_answer_wins_then_null_default() {
        let mut chain = DeviceChain::default();
        chain.push(Box::new(Pass));
        chain.push(Box::new(FixedCaps(4)));
        assert_eq!(chain.names(), vec!["fixed", "pass", "null"]);

        assert_eq!(chain.head().get_device_caps(DeviceCap::Planes), 4);
        // unhandled codes fall through both layers
        assert_eq!(chain.head().get_device_caps(DeviceCap::HorzRes), 640);

        chain.pop();
        assert_eq!(chain.head().get_device_caps(DeviceCap::Planes), 1);
    }

    #[test]
    fn test_null_layer_cannot_be_removed() {
        let mut chain = DeviceChain::new(NullLayer::new(DeviceCaps::with_dpi(120)));
        assert!(chain.pop().is_none());
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.head().get_device_caps(DeviceCap::LogPixelsX), 120);
    }

    #[test]
    fn test_every_operation_resolves() {
        let pen = LogPen::new(PenStyle::Solid, 1, ColorRef::BLACK);
        let brush = LogBrush::solid(ColorRef::WHITE);
        let font = LogFont::default();
        let bitmap = Bitmap::new(2, 2, 32);
        let rect = Rect::new(0, 0, 4, 4);
        let handle = Handle::new(40, 1);

        for depth in 0..3 {
            let mut chain = DeviceChain::default();
            for _ in 0..depth {
                chain.push(Box::new(Pass));
            }
            let red = ColorRef::rgb(255, 0, 0);
            assert_eq!(chain.head().set_bk_color(red), red);
            assert_eq!(chain.head().set_text_color(red), red);
            assert_eq!(chain.head().set_dc_brush_color(red), red);
            assert_eq!(chain.head().set_dc_pen_color(red), red);
            assert_eq!(chain.head().set_arc_direction(2), 2);
            assert_eq!(chain.head().set_layout(1), 1);
            assert!(chain.head().select_pen(handle, &pen));
            assert!(chain.head().select_brush(handle, &brush));
            assert!(chain.head().select_font(handle, &font));
            assert!(chain.head().select_bitmap(handle, &bitmap));
            assert!(chain.head().select_palette(handle, false));
            assert_eq!(chain.head().realize_default_palette(), 0);
            assert!(chain.head().delete_object(handle));
            assert!(chain.head().save_dc(1));
            assert!(chain.head().restore_dc(1));
            assert!(chain.head().line_to(Point::new(0, 0), Point::new(3, 3)));
            assert!(chain.head().rectangle(rect));
            assert!(chain.head().ellipse(rect));
            assert!(chain.head().polyline(&[Point::new(0, 0), Point::new(1, 1)]));
            assert!(chain.head().pat_blt(rect, crate::driver::rop::PATCOPY));
            assert_eq!(chain.head().set_pixel(Point::new(1, 1), red), ColorRef::INVALID);
            assert_eq!(chain.head().get_pixel(Point::new(1, 1)), ColorRef::INVALID);
            assert!(chain.head().ext_text_out(Point::new(0, 0), "text", None));
            assert_eq!(chain.head().get_text_metrics(), None);
            assert_eq!(chain.head().get_text_extent("text"), None);
            assert_eq!(chain.head().get_image(rect), None);
            assert_eq!(chain.head().get_device_gamma_ramp(), None);
            assert!(!chain.head().set_device_gamma_ramp(&GammaRamp::linear()));
            for cap in DeviceCap::ALL {
                assert_eq!(chain.head().get_device_caps(cap), DeviceCaps::default().query(cap));
            }
        }
    }

    #[test]
    fn test_empty_cursor_falls_back_to_null() {
        assert_eq!(Next::end().get_device_caps(DeviceCap::Planes), 1);
        assert!(Next::end().rectangle(Rect::new(0, 0, 1, 1)));
    }

    #[test]
    fn test_teardown_deletes_each_layer_once() {
        let deleted = Arc::new(AtomicUsize::new(0));
        let mut chain = DeviceChain::default();
        chain.push(Box::new(Dropped(deleted.clone())));
        chain.push(Box::new(Dropped(deleted.clone())));

        chain.teardown();
        chain.teardown();
        assert_eq!(deleted.load(Ordering::SeqCst), 2);
        assert_eq!(chain.names(), vec!["null"]);
    }
}
