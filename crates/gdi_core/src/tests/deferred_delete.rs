//! Deletion of objects that are still selected

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::GdiConfig;
use crate::driver::{DeviceLayer, Next};
use crate::foundation::color::ColorRef;
use crate::handle::{Handle, ObjectType};
use crate::object::{PenStyle, StockObject};
use crate::{DeleteOutcome, Gdi};

/// Counts delete notifications per handle
struct DeleteCounter {
    watched: Handle,
    seen: Arc<AtomicUsize>,
}

impl DeviceLayer for DeleteCounter {
    fn name(&self) -> &'static str {
        "delete-counter"
    }

    fn delete_object(&mut self, next: Next<'_>, handle: Handle) -> bool {
        if handle == self.watched {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }
        next.delete_object(handle)
    }
}

#[test]
fn test_referenced_pen_is_deleted_on_last_release() {
    let gdi = Gdi::new(GdiConfig::default()).unwrap();
    let hdc = gdi.create_dc("DISPLAY").unwrap();
    let pen = gdi.create_pen(PenStyle::Solid, 1, ColorRef::rgb(0, 0, 255)).unwrap();
    let seen = Arc::new(AtomicUsize::new(0));
    gdi.push_layer(
        hdc,
        Box::new(DeleteCounter {
            watched: pen,
            seen: Arc::clone(&seen),
        }),
    )
    .unwrap();
    gdi.add_object_user(pen, hdc).unwrap();

    assert_eq!(gdi.acquire_ref(pen).unwrap(), 1);
    assert_eq!(gdi.delete_object(pen).unwrap(), DeleteOutcome::Deferred);
    assert_eq!(gdi.get_object_type(pen).unwrap(), ObjectType::Pen);
    assert_eq!(seen.load(Ordering::SeqCst), 0);

    assert_eq!(gdi.release_ref(pen).unwrap(), 0);
    assert!(gdi.get_object_type(pen).is_err());
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert!(gdi.release_ref(pen).is_err());
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    gdi.delete_dc(hdc).unwrap();
}

#[test]
fn test_selected_brush_outlives_delete_until_deselected() {
    let gdi = Gdi::new(GdiConfig::default()).unwrap();
    let hdc = gdi.create_compatible_dc(None).unwrap();
    let brush = gdi.create_solid_brush(ColorRef::rgb(10, 20, 30)).unwrap();
    let white = gdi.select_object(hdc, brush).unwrap();

    assert_eq!(gdi.delete_object(brush).unwrap(), DeleteOutcome::Deferred);
    assert_eq!(gdi.delete_object(brush).unwrap(), DeleteOutcome::Deferred);
    assert_eq!(gdi.get_current_object(hdc, ObjectType::Brush).unwrap(), brush);

    gdi.select_object(hdc, white).unwrap();
    assert!(gdi.get_object_type(brush).is_err());
    gdi.delete_dc(hdc).unwrap();
}

#[test]
fn test_saved_levels_keep_objects_alive() {
    let gdi = Gdi::new(GdiConfig::default()).unwrap();
    let hdc = gdi.create_dc("DISPLAY").unwrap();
    let pen = gdi.create_pen(PenStyle::Dot, 1, ColorRef::BLACK).unwrap();
    gdi.select_object(hdc, pen).unwrap();
    gdi.save_dc(hdc).unwrap();
    assert_eq!(gdi.ref_count(pen).unwrap(), 2);

    gdi.select_object(hdc, gdi.get_stock_object(StockObject::NullPen)).unwrap();
    assert_eq!(gdi.delete_object(pen).unwrap(), DeleteOutcome::Deferred);

    gdi.restore_dc(hdc, -1).unwrap();
    assert_eq!(gdi.get_current_object(hdc, ObjectType::Pen).unwrap(), pen);
    assert_eq!(gdi.ref_count(pen).unwrap(), 1);

    gdi.delete_dc(hdc).unwrap();
    assert!(gdi.get_object_type(pen).is_err());
}

#[test]
fn test_deleting_context_releases_its_selection() {
    let gdi = Gdi::new(GdiConfig::default()).unwrap();
    let hdc = gdi.create_compatible_dc(None).unwrap();
    let font = gdi.create_font(crate::object::LogFont::new("Mono", 10)).unwrap();
    gdi.select_object(hdc, font).unwrap();
    assert_eq!(gdi.delete_object(font).unwrap(), DeleteOutcome::Deferred);
    gdi.delete_dc(hdc).unwrap();
    assert!(gdi.get_object_type(font).is_err());
    assert!(gdi.shutdown().is_empty());
}
