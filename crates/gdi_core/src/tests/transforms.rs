//! Transform math as seen through a device context

use approx::assert_relative_eq;

use crate::config::GdiConfig;
use crate::dc::modes::{GraphicsMode, Layout, MapMode, TransformKind, WorldModify};
use crate::driver::DeviceCap;
use crate::foundation::math::{Point, Size, Xform};
use crate::{Gdi, GdiError};

#[test]
fn test_zero_window_extent_flags_inverse_invalid() {
    let gdi = Gdi::new(GdiConfig::default()).unwrap();
    let hdc = gdi.create_dc("DISPLAY").unwrap();
    gdi.set_map_mode(hdc, MapMode::Anisotropic).unwrap();
    gdi.set_viewport_org(hdc, Point::new(5, 6)).unwrap();
    gdi.set_window_ext(hdc, Size::new(0, 10)).unwrap();

    let forward = gdi.get_transform(hdc, TransformKind::WorldToDevice).unwrap();
    assert!(forward.m11.is_finite() && forward.m22.is_finite());
    assert_eq!(gdi.lp_to_dp(hdc, &[Point::new(40, 0)]).unwrap(), vec![Point::new(5, 6)]);
    assert!(matches!(
        gdi.get_transform(hdc, TransformKind::DeviceToWorld),
        Err(GdiError::SingularTransform)
    ));
    assert!(matches!(
        gdi.dp_to_lp(hdc, &[Point::new(5, 6)]),
        Err(GdiError::SingularTransform)
    ));

    gdi.set_window_ext(hdc, Size::new(10, 10)).unwrap();
    assert!(gdi.get_transform(hdc, TransformKind::DeviceToWorld).is_ok());
    gdi.delete_dc(hdc).unwrap();
}

#[test]
fn test_inverse_law_with_world_transform() {
    let gdi = Gdi::new(GdiConfig::default()).unwrap();
    let hdc = gdi.create_dc("DISPLAY").unwrap();
    gdi.set_graphics_mode(hdc, GraphicsMode::Advanced).unwrap();
    let rotate = Xform::new(0.6, 0.8, -0.8, 0.6, 12.0, -3.0);
    gdi.set_world_transform(hdc, &rotate).unwrap();
    gdi.modify_world_transform(hdc, &Xform::scale_translate(2.0, 0.5, 1.0, 1.0), WorldModify::RightMultiply)
        .unwrap();
    gdi.set_map_mode(hdc, MapMode::Anisotropic).unwrap();
    gdi.set_window_ext(hdc, Size::new(3, 7)).unwrap();
    gdi.set_viewport_ext(hdc, Size::new(11, -5)).unwrap();

    let forward = gdi.get_transform(hdc, TransformKind::WorldToDevice).unwrap();
    let inverse = gdi.get_transform(hdc, TransformKind::DeviceToWorld).unwrap();
    let product = forward.then(&inverse);
    assert_relative_eq!(product.m11, 1.0, epsilon = 1e-9);
    assert_relative_eq!(product.m12, 0.0, epsilon = 1e-9);
    assert_relative_eq!(product.m21, 0.0, epsilon = 1e-9);
    assert_relative_eq!(product.m22, 1.0, epsilon = 1e-9);
    assert_relative_eq!(product.dx, 0.0, epsilon = 1e-9);
    assert_relative_eq!(product.dy, 0.0, epsilon = 1e-9);

    let page = gdi.get_transform(hdc, TransformKind::PageToDevice).unwrap();
    assert_relative_eq!(page.m11, 11.0 / 3.0, epsilon = 1e-12);
    assert_relative_eq!(page.m22, -5.0 / 7.0, epsilon = 1e-12);
    gdi.delete_dc(hdc).unwrap();
}

#[test]
fn test_metric_mode_flips_y_and_uses_device_size() {
    let gdi = Gdi::new(GdiConfig::default()).unwrap();
    let hdc = gdi.create_dc("DISPLAY").unwrap();
    let horz_mm = gdi.get_device_caps(hdc, DeviceCap::HorzSize).unwrap();
    let horz_res = gdi.get_device_caps(hdc, DeviceCap::HorzRes).unwrap();
    gdi.set_map_mode(hdc, MapMode::LoMetric).unwrap();

    assert_eq!(gdi.get_window_ext(hdc).unwrap().cx, horz_mm * 10);
    assert_eq!(gdi.get_viewport_ext(hdc).unwrap().cx, horz_res);
    let page = gdi.get_transform(hdc, TransformKind::PageToDevice).unwrap();
    assert!(page.m22 < 0.0);
    assert_eq!(gdi.set_window_ext(hdc, Size::new(1, 1)).unwrap().cx, horz_mm * 10);
    gdi.delete_dc(hdc).unwrap();
}

#[test]
fn test_right_to_left_layout_mirrors_x() {
    let gdi = Gdi::new(GdiConfig::default()).unwrap();
    let hdc = gdi.create_compatible_dc(None).unwrap();
    let bitmap = gdi.create_bitmap(100, 10, 32).unwrap();
    gdi.select_object(hdc, bitmap).unwrap();

    assert_eq!(gdi.set_layout(hdc, Layout::RTL).unwrap(), Layout::empty());
    assert_eq!(gdi.get_map_mode(hdc).unwrap(), MapMode::Anisotropic);
    assert_eq!(gdi.lp_to_dp(hdc, &[Point::new(0, 0)]).unwrap(), vec![Point::new(99, 0)]);
    assert_eq!(gdi.lp_to_dp(hdc, &[Point::new(10, 3)]).unwrap(), vec![Point::new(89, 3)]);
    gdi.delete_dc(hdc).unwrap();
}
