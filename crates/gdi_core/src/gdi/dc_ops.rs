//! Device context lifecycle, selection and plain attributes

use std::sync::Arc;

use crate::arena::DcAttr;
use crate::dc::modes::{ArcDirection, BackgroundMode, PolyFillMode, RelAbsMode, Rop2, StretchMode, TextAlign};
use crate::dc::{DcStock, DcState, DeviceContext, Selected, Selection};
use crate::driver::{BackendContext, DeviceCaps, DeviceChain, DeviceLayer, MemoryLayer, NullLayer};
use crate::error::{GdiError, GdiResult};
use crate::foundation::color::ColorRef;
use crate::foundation::math::{Point, Rect};
use crate::handle::{Handle, ObjectType};
use crate::object::{Bitmap, GdiObject, LogBrush, LogFont, LogPen, ObjectBody, StockObject};

use super::{fetch, Gdi};

/// Object kinds [`Gdi::select_object`] accepts
enum Selectable {
    Pen(LogPen),
    Brush(LogBrush),
    Font(LogFont),
    Bitmap(Bitmap),
}

impl Gdi {
    fn display_caps(&self) -> DeviceCaps {
        BackendContext {
            display: self.config.display.clone(),
            dpi: self.dpi,
        }
        .caps()
    }

    /// Stock selection of a new or reset context, with its references taken
    fn default_selection(&self, with_bitmap: bool) -> GdiResult<Selection> {
        let mut table = self.table.lock();
        let pen_handle = self.stock.get(StockObject::BlackPen);
        let brush_handle = self.stock.get(StockObject::WhiteBrush);
        let font_handle = self.stock.get(StockObject::SystemFont);
        let palette = self.stock.get(StockObject::DefaultPalette);

        let pen = fetch(&table, pen_handle, "pen", |body| match body {
            ObjectBody::Pen(pen) => Some(*pen),
            _ => None,
        })?;
        let brush = fetch(&table, brush_handle, "brush", |body| match body {
            ObjectBody::Brush(brush) => Some(*brush),
            _ => None,
        })?;
        let font = fetch(&table, font_handle, "font", |body| match body {
            ObjectBody::Font(font) => Some(font.clone()),
            _ => None,
        })?;
        fetch(&table, palette, "palette", |body| matches!(body, ObjectBody::Palette(_)).then_some(()))?;
        let bitmap = if with_bitmap {
            let handle = self.stock.get(StockObject::DefaultBitmap);
            let bitmap = fetch(&table, handle, "bitmap", |body| match body {
                ObjectBody::Bitmap(bitmap) => Some(bitmap.clone()),
                _ => None,
            })?;
            Some(Selected::new(handle, bitmap))
        } else {
            None
        };

        let selection = Selection {
            pen: Selected::new(pen_handle, pen),
            brush: Selected::new(brush_handle, brush),
            font: Selected::new(font_handle, font),
            palette,
            bitmap,
        };
        for handle in selection.handles() {
            if let Some(object) = table.lookup_mut(handle) {
                object.header.selcount += 1;
            }
        }
        Ok(selection)
    }

    /// Create a display context
    ///
    /// `driver` is `"DISPLAY"` or the configured driver name, in any case.
    pub fn create_dc(&self, driver: &str) -> GdiResult<Handle> {
        if !driver.eq_ignore_ascii_case("DISPLAY") && !driver.eq_ignore_ascii_case(self.loader.driver()) {
            return Err(GdiError::invalid(format!("unknown driver {driver:?}")));
        }
        let mut chain = DeviceChain::new(NullLayer::new(self.display_caps()));
        chain.push(Box::new(self.loader.lazy_layer()));
        let vis_rect = Rect::new(0, 0, self.config.display.width, self.config.display.height);
        self.create_dc_object(ObjectType::Dc, chain, vis_rect)
    }

    /// Create a memory context with a 1x1 default surface
    ///
    /// `reference`, when given, must be a live device context.
    pub fn create_compatible_dc(&self, reference: Option<Handle>) -> GdiResult<Handle> {
        if let Some(hdc) = reference {
            self.dc_arc(hdc)?;
        }
        let mut chain = DeviceChain::new(NullLayer::new(self.display_caps()));
        chain.push(Box::new(MemoryLayer::new()));
        self.create_dc_object(ObjectType::MemDc, chain, Rect::new(0, 0, 1, 1))
    }

    fn create_dc_object(&self, kind: ObjectType, chain: DeviceChain, vis_rect: Rect) -> GdiResult<Handle> {
        let selection = self.default_selection(kind == ObjectType::MemDc)?;
        let block = match self.arena.lock().alloc() {
            Ok(block) => block,
            Err(err) => {
                self.release_all(&selection.handles());
                return Err(err);
            }
        };
        let dc_stock = DcStock {
            brush: self.stock.get(StockObject::DcBrush),
            pen: self.stock.get(StockObject::DcPen),
        };
        let state = DcState::new(
            kind,
            block,
            selection,
            dc_stock,
            vis_rect,
            chain,
            self.config.transform.singular_epsilon,
        );
        let dc = Arc::new(DeviceContext::new(kind, state));

        let allocated = self
            .table
            .lock()
            .allocate(GdiObject::new(ObjectBody::Dc(Arc::clone(&dc))), kind);
        let Ok(hdc) = allocated else {
            let released = {
                let mut state = dc.state()?;
                state.teardown(&self.arena);
                state.take_released()
            };
            self.release_all(&released);
            return Err(GdiError::OutOfHandles {
                capacity: self.config.handles.capacity,
            });
        };

        dc.bind(hdc);
        {
            let mut state = dc.state()?;
            state.bind(hdc);
            self.publish(&state);
        }
        log::debug!("Created {:?} {}", kind, hdc);
        Ok(hdc)
    }

    /// Delete a device context
    ///
    /// Fails with [`GdiError::DcInUse`] while the context is claimed anywhere
    /// else, including by an outer claim of the calling thread.
    pub fn delete_dc(&self, hdc: Handle) -> GdiResult<()> {
        let guard = self.lock_dc(hdc)?;
        if guard.dc().count() != 1 {
            return Err(GdiError::DcInUse(hdc));
        }
        let (registered, released) = {
            let mut state = guard.dc().state()?;
            guard.dc().mark_deleted();
            let registered = state.teardown(&self.arena);
            (registered, state.take_released())
        };
        self.table.lock().free(hdc);
        drop(guard);

        for object in registered {
            // objects may already be gone
            let _ = self.remove_object_user(object, hdc);
        }
        self.release_all(&released);
        log::debug!("Deleted device context {}", hdc);
        Ok(())
    }

    /// Return a context to its creation defaults, dropping every saved level
    pub fn reset_dc(&self, hdc: Handle) -> GdiResult<()> {
        let defaults = self.default_selection(false)?;
        let handles = defaults.handles();
        let result = self.with_dc(hdc, |state| {
            state.reset(defaults, &self.arena);
            Ok(())
        });
        if result.is_err() {
            self.release_all(&handles);
        }
        result
    }

    /// Push the current state; returns the new save level
    pub fn save_dc(&self, hdc: Handle) -> GdiResult<i32> {
        self.with_dc(hdc, |state| {
            let (level, handles) = state.save(&self.arena)?;
            self.add_refs(&handles);
            Ok(level)
        })
    }

    /// Pop back to a saved level; negative levels count back from the current one
    pub fn restore_dc(&self, hdc: Handle, level: i32) -> GdiResult<()> {
        self.with_dc(hdc, |state| state.restore(level, &self.arena))
    }

    /// Current save depth
    pub fn get_save_level(&self, hdc: Handle) -> GdiResult<i32> {
        self.with_dc(hdc, |state| Ok(state.save_level()))
    }

    // --- selection

    /// Select a pen, brush, font or (memory contexts only) bitmap
    ///
    /// Returns the handle previously selected in that slot.
    pub fn select_object(&self, hdc: Handle, object: Handle) -> GdiResult<Handle> {
        self.with_dc(hdc, |state| {
            let selected_bitmap = state.selection().bitmap.as_ref().map(|b| b.handle);
            let (selectable, system) = {
                let mut table = self.table.lock();
                let entry = table.lookup_mut(object).ok_or(GdiError::InvalidHandle(object))?;
                let selectable = match &entry.body {
                    ObjectBody::Pen(pen) => Selectable::Pen(*pen),
                    ObjectBody::Brush(brush) => Selectable::Brush(*brush),
                    ObjectBody::Font(font) => Selectable::Font(font.clone()),
                    ObjectBody::Bitmap(_) if !state.is_memory() => {
                        return Err(GdiError::invalid("bitmaps can only be selected into memory contexts"));
                    }
                    ObjectBody::Bitmap(_) if selected_bitmap == Some(object) => return Ok(object),
                    ObjectBody::Bitmap(_)
                        if entry.header.selcount > 0 && !entry.header.system && entry.header.selected_in != hdc =>
                    {
                        return Err(GdiError::invalid(format!(
                            "bitmap {object} is selected into {}",
                            entry.header.selected_in
                        )));
                    }
                    ObjectBody::Bitmap(bitmap) => Selectable::Bitmap(bitmap.clone()),
                    ObjectBody::Palette(_) | ObjectBody::Region(_) | ObjectBody::Dc(_) => {
                        return Err(GdiError::WrongType {
                            handle: object,
                            expected: "pen, brush, font or bitmap",
                            found: entry.object_type(),
                        });
                    }
                };
                entry.header.selcount += 1;
                if !entry.header.system {
                    entry.header.add_user(hdc);
                }
                if matches!(selectable, Selectable::Bitmap(_)) {
                    entry.header.selected_in = hdc;
                }
                (selectable, entry.header.system)
            };
            if !system {
                state.note_registered(object);
            }

            match selectable {
                Selectable::Pen(pen) => state.select_pen(Selected::new(object, pen)),
                Selectable::Brush(brush) => state.select_brush(Selected::new(object, brush)),
                Selectable::Font(font) => state.select_font(Selected::new(object, font)),
                Selectable::Bitmap(bitmap) => state.select_bitmap(Selected::new(object, bitmap)),
            }
        })
    }

    /// Select a logical palette, returning the previous one
    pub fn select_palette(&self, hdc: Handle, palette: Handle, background: bool) -> GdiResult<Handle> {
        self.with_dc(hdc, |state| {
            {
                let mut table = self.table.lock();
                fetch(&table, palette, "palette", |body| matches!(body, ObjectBody::Palette(_)).then_some(()))?;
                if let Some(entry) = table.lookup_mut(palette) {
                    entry.header.selcount += 1;
                }
            }
            state.select_palette(palette, background)
        })
    }

    /// Handle currently selected for one object kind
    ///
    /// A display context reports a null bitmap.
    pub fn get_current_object(&self, hdc: Handle, kind: ObjectType) -> GdiResult<Handle> {
        self.with_dc(hdc, |state| {
            let selection = state.selection();
            match kind {
                ObjectType::Pen => Ok(selection.pen.handle),
                ObjectType::Brush => Ok(selection.brush.handle),
                ObjectType::Font => Ok(selection.font.handle),
                ObjectType::Palette => Ok(selection.palette),
                ObjectType::Bitmap => Ok(selection.bitmap.as_ref().map_or(Handle::NULL, |b| b.handle)),
                ObjectType::Region | ObjectType::Dc | ObjectType::MemDc => {
                    Err(GdiError::invalid(format!("{kind:?} is not a selectable kind")))
                }
            }
        })
    }

    // --- dispatch chain

    /// Add a layer on the outside of a context's chain
    pub fn push_layer(&self, hdc: Handle, layer: Box<dyn DeviceLayer>) -> GdiResult<()> {
        self.with_dc(hdc, |state| {
            log::debug!("Device context {}: pushing {} layer", hdc, layer.name());
            state.chain().push(layer);
            Ok(())
        })
    }

    /// Remove and delete the outermost layer; returns its name
    ///
    /// The null layer is never removed.
    pub fn pop_layer(&self, hdc: Handle) -> GdiResult<Option<&'static str>> {
        self.with_dc(hdc, |state| {
            Ok(state.chain().pop().map(|mut layer| {
                layer.delete_dc();
                layer.name()
            }))
        })
    }

    /// Layer names, outermost first
    pub fn layer_names(&self, hdc: Handle) -> GdiResult<Vec<&'static str>> {
        self.with_dc(hdc, |state| Ok(state.chain().names()))
    }

    // --- attributes

    fn read_attr<R>(&self, hdc: Handle, read: impl FnOnce(&DcAttr) -> R) -> GdiResult<R> {
        self.with_dc(hdc, |state| Ok(read(state.attr())))
    }

    fn write_attr<R>(&self, hdc: Handle, write: impl FnOnce(&mut DcAttr) -> R) -> GdiResult<R> {
        self.with_dc(hdc, |state| Ok(write(state.attr_mut())))
    }

    /// Background color
    pub fn get_bk_color(&self, hdc: Handle) -> GdiResult<ColorRef> {
        self.read_attr(hdc, |attr| attr.background_color)
    }

    /// Set the background color, returning the previous one
    pub fn set_bk_color(&self, hdc: Handle, color: ColorRef) -> GdiResult<ColorRef> {
        self.with_dc(hdc, |state| state.set_bk_color(color))
    }

    /// Text color
    pub fn get_text_color(&self, hdc: Handle) -> GdiResult<ColorRef> {
        self.read_attr(hdc, |attr| attr.text_color)
    }

    /// Set the text color, returning the previous one
    pub fn set_text_color(&self, hdc: Handle, color: ColorRef) -> GdiResult<ColorRef> {
        self.with_dc(hdc, |state| state.set_text_color(color))
    }

    /// Color of the `DC_BRUSH` stock brush in this context
    pub fn get_dc_brush_color(&self, hdc: Handle) -> GdiResult<ColorRef> {
        self.read_attr(hdc, |attr| attr.brush_color)
    }

    /// Set the `DC_BRUSH` color, returning the previous one
    pub fn set_dc_brush_color(&self, hdc: Handle, color: ColorRef) -> GdiResult<ColorRef> {
        self.with_dc(hdc, |state| state.set_dc_brush_color(color))
    }

    /// Color of the `DC_PEN` stock pen in this context
    pub fn get_dc_pen_color(&self, hdc: Handle) -> GdiResult<ColorRef> {
        self.read_attr(hdc, |attr| attr.pen_color)
    }

    /// Set the `DC_PEN` color, returning the previous one
    pub fn set_dc_pen_color(&self, hdc: Handle, color: ColorRef) -> GdiResult<ColorRef> {
        self.with_dc(hdc, |state| state.set_dc_pen_color(color))
    }

    /// Text alignment flags
    pub fn get_text_align(&self, hdc: Handle) -> GdiResult<TextAlign> {
        self.read_attr(hdc, |attr| TextAlign::from_bits_truncate(attr.text_align))
    }

    /// Set the text alignment, returning the previous flags
    pub fn set_text_align(&self, hdc: Handle, align: TextAlign) -> GdiResult<TextAlign> {
        self.write_attr(hdc, |attr| {
            TextAlign::from_bits_truncate(std::mem::replace(&mut attr.text_align, align.bits()))
        })
    }

    /// Background mix mode
    pub fn get_bk_mode(&self, hdc: Handle) -> GdiResult<BackgroundMode> {
        self.read_attr(hdc, |attr| {
            BackgroundMode::from_raw(attr.background_mode).unwrap_or(BackgroundMode::Opaque)
        })
    }

    /// Set the background mix mode, returning the previous one
    pub fn set_bk_mode(&self, hdc: Handle, mode: BackgroundMode) -> GdiResult<BackgroundMode> {
        self.write_attr(hdc, |attr| {
            let previous = std::mem::replace(&mut attr.background_mode, mode as u32);
            BackgroundMode::from_raw(previous).unwrap_or(BackgroundMode::Opaque)
        })
    }

    /// Foreground mix mode
    pub fn get_rop2(&self, hdc: Handle) -> GdiResult<Rop2> {
        self.read_attr(hdc, |attr| Rop2::from_raw(attr.rop2).unwrap_or(Rop2::COPY_PEN))
    }

    /// Set the foreground mix mode, returning the previous one
    pub fn set_rop2(&self, hdc: Handle, rop2: Rop2) -> GdiResult<Rop2> {
        self.write_attr(hdc, |attr| {
            Rop2::from_raw(std::mem::replace(&mut attr.rop2, rop2.raw())).unwrap_or(Rop2::COPY_PEN)
        })
    }

    /// Polygon fill mode
    pub fn get_poly_fill_mode(&self, hdc: Handle) -> GdiResult<PolyFillMode> {
        self.read_attr(hdc, |attr| {
            PolyFillMode::from_raw(attr.poly_fill_mode).unwrap_or(PolyFillMode::Alternate)
        })
    }

    /// Set the polygon fill mode, returning the previous one
    pub fn set_poly_fill_mode(&self, hdc: Handle, mode: PolyFillMode) -> GdiResult<PolyFillMode> {
        self.write_attr(hdc, |attr| {
            let previous = std::mem::replace(&mut attr.poly_fill_mode, mode as u32);
            PolyFillMode::from_raw(previous).unwrap_or(PolyFillMode::Alternate)
        })
    }

    /// Bitmap stretching mode
    pub fn get_stretch_blt_mode(&self, hdc: Handle) -> GdiResult<StretchMode> {
        self.read_attr(hdc, |attr| {
            StretchMode::from_raw(attr.stretch_blt_mode).unwrap_or(StretchMode::BlackOnWhite)
        })
    }

    /// Set the stretching mode, returning the previous one
    pub fn set_stretch_blt_mode(&self, hdc: Handle, mode: StretchMode) -> GdiResult<StretchMode> {
        self.write_attr(hdc, |attr| {
            let previous = std::mem::replace(&mut attr.stretch_blt_mode, mode as u32);
            StretchMode::from_raw(previous).unwrap_or(StretchMode::BlackOnWhite)
        })
    }

    /// Relative or absolute coordinates for line drawing
    pub fn get_rel_abs(&self, hdc: Handle) -> GdiResult<RelAbsMode> {
        self.read_attr(hdc, |attr| RelAbsMode::from_raw(attr.rel_abs_mode).unwrap_or(RelAbsMode::Absolute))
    }

    /// Set the coordinate mode, returning the previous one
    pub fn set_rel_abs(&self, hdc: Handle, mode: RelAbsMode) -> GdiResult<RelAbsMode> {
        self.write_attr(hdc, |attr| {
            let previous = std::mem::replace(&mut attr.rel_abs_mode, mode as u32);
            RelAbsMode::from_raw(previous).unwrap_or(RelAbsMode::Absolute)
        })
    }

    /// Arc and rectangle drawing direction
    pub fn get_arc_direction(&self, hdc: Handle) -> GdiResult<ArcDirection> {
        self.read_attr(hdc, |attr| {
            ArcDirection::from_raw(attr.arc_direction).unwrap_or(ArcDirection::CounterClockwise)
        })
    }

    /// Set the arc direction, returning the previous one
    pub fn set_arc_direction(&self, hdc: Handle, direction: ArcDirection) -> GdiResult<ArcDirection> {
        self.with_dc(hdc, |state| state.set_arc_direction(direction))
    }

    /// Miter length limit for joins
    pub fn get_miter_limit(&self, hdc: Handle) -> GdiResult<f32> {
        self.read_attr(hdc, |attr| attr.miter_limit)
    }

    /// Set the miter limit, returning the previous one
    pub fn set_miter_limit(&self, hdc: Handle, limit: f32) -> GdiResult<f32> {
        if !limit.is_finite() || limit < 1.0 {
            return Err(GdiError::invalid(format!("miter limit {limit}")));
        }
        self.write_attr(hdc, |attr| std::mem::replace(&mut attr.miter_limit, limit))
    }

    /// Extra spacing added between characters
    pub fn get_text_character_extra(&self, hdc: Handle) -> GdiResult<i32> {
        self.read_attr(hdc, |attr| attr.char_extra)
    }

    /// Set the extra character spacing, returning the previous value
    pub fn set_text_character_extra(&self, hdc: Handle, extra: i32) -> GdiResult<i32> {
        self.write_attr(hdc, |attr| std::mem::replace(&mut attr.char_extra, extra))
    }

    /// Brush origin in device units
    pub fn get_brush_org(&self, hdc: Handle) -> GdiResult<Point> {
        self.read_attr(hdc, |attr| attr.brush_org)
    }

    /// Set the brush origin, returning the previous one
    pub fn set_brush_org(&self, hdc: Handle, org: Point) -> GdiResult<Point> {
        self.write_attr(hdc, |attr| std::mem::replace(&mut attr.brush_org, org))
    }

    /// Current position in logical units
    pub fn get_current_position(&self, hdc: Handle) -> GdiResult<Point> {
        self.read_attr(hdc, |attr| attr.cur_pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GdiConfig;
    use crate::error::DeleteOutcome;
    use crate::object::PenStyle;

    fn gdi() -> Gdi {
        Gdi::new(GdiConfig::default()).unwrap()
    }

    #[test]
    fn test_create_dc_rejects_unknown_driver() {
        let gdi = gdi();
        assert!(gdi.create_dc("WINSPOOL").is_err());
        let hdc = gdi.create_dc("display").unwrap();
        assert_eq!(gdi.get_object_type(hdc).unwrap(), ObjectType::Dc);
        let hdc2 = gdi.create_dc("HEADLESS").unwrap();
        assert_ne!(hdc, hdc2);
    }

    #[test]
    fn test_new_context_holds_stock_references() {
        let gdi = gdi();
        let pen = gdi.get_stock_object(StockObject::BlackPen);
        let before = gdi.ref_count(pen).unwrap();
        let hdc = gdi.create_compatible_dc(None).unwrap();
        assert_eq!(gdi.ref_count(pen).unwrap(), before + 1);
        assert_eq!(gdi.get_current_object(hdc, ObjectType::Pen).unwrap(), pen);
        assert_eq!(
            gdi.get_current_object(hdc, ObjectType::Bitmap).unwrap(),
            gdi.get_stock_object(StockObject::DefaultBitmap)
        );
        gdi.delete_dc(hdc).unwrap();
        assert_eq!(gdi.ref_count(pen).unwrap(), before);
        assert!(gdi.delete_dc(hdc).is_err());
    }

    #[test]
    fn test_select_returns_previous_and_tracks_users() {
        let gdi = gdi();
        let hdc = gdi.create_dc("DISPLAY").unwrap();
        let pen = gdi.create_pen(PenStyle::Solid, 3, ColorRef::rgb(1, 2, 3)).unwrap();
        let previous = gdi.select_object(hdc, pen).unwrap();
        assert_eq!(previous, gdi.get_stock_object(StockObject::BlackPen));
        assert_eq!(gdi.ref_count(pen).unwrap(), 1);
        assert_eq!(gdi.object_users(pen).unwrap(), vec![hdc]);

        assert_eq!(gdi.delete_object(pen).unwrap(), DeleteOutcome::Deferred);
        gdi.select_object(hdc, previous).unwrap();
        assert!(gdi.get_object_type(pen).is_err());
        gdi.delete_dc(hdc).unwrap();
    }

    #[test]
    fn test_select_rejects_wrong_kinds() {
        let gdi = gdi();
        let hdc = gdi.create_dc("DISPLAY").unwrap();
        let bitmap = gdi.create_bitmap(4, 4, 32).unwrap();
        let region = gdi.create_rect_region(Rect::new(0, 0, 2, 2)).unwrap();
        assert!(gdi.select_object(hdc, bitmap).is_err());
        assert!(matches!(gdi.select_object(hdc, region), Err(GdiError::WrongType { .. })));
        assert!(matches!(gdi.select_object(hdc, hdc), Err(GdiError::WrongType { .. })));
        assert_eq!(gdi.ref_count(bitmap).unwrap(), 0);
        gdi.delete_dc(hdc).unwrap();
    }

    #[test]
    fn test_bitmap_in_one_memory_context_at_a_time() {
        let gdi = gdi();
        let first = gdi.create_compatible_dc(None).unwrap();
        let second = gdi.create_compatible_dc(Some(first)).unwrap();
        let bitmap = gdi.create_bitmap(8, 8, 32).unwrap();
        gdi.select_object(first, bitmap).unwrap();
        assert_eq!(gdi.select_object(first, bitmap).unwrap(), bitmap);
        assert_eq!(gdi.ref_count(bitmap).unwrap(), 1);
        assert!(gdi.select_object(second, bitmap).is_err());
        gdi.delete_dc(first).unwrap();
        gdi.select_object(second, bitmap).unwrap();
        gdi.delete_dc(second).unwrap();
        assert_eq!(gdi.ref_count(bitmap).unwrap(), 0);
    }

    #[test]
    fn test_bitmap_held_by_saved_level_can_be_reselected() {
        let gdi = gdi();
        let hdc = gdi.create_compatible_dc(None).unwrap();
        let other = gdi.create_compatible_dc(None).unwrap();
        let first = gdi.create_bitmap(4, 4, 32).unwrap();
        let second = gdi.create_bitmap(4, 4, 32).unwrap();
        gdi.select_object(hdc, first).unwrap();
        gdi.save_dc(hdc).unwrap();
        assert_eq!(gdi.select_object(hdc, second).unwrap(), first);
        assert_eq!(gdi.ref_count(first).unwrap(), 1);

        assert!(gdi.select_object(other, first).is_err());
        assert_eq!(gdi.select_object(hdc, first).unwrap(), second);
        assert_eq!(gdi.ref_count(first).unwrap(), 2);
        gdi.restore_dc(hdc, 1).unwrap();
        assert_eq!(gdi.get_current_object(hdc, ObjectType::Bitmap).unwrap(), first);

        gdi.delete_dc(hdc).unwrap();
        gdi.select_object(other, second).unwrap();
        gdi.delete_dc(other).unwrap();
        assert_eq!(gdi.ref_count(first).unwrap(), 0);
    }

    #[test]
    fn test_attribute_setters_return_previous() {
        let gdi = gdi();
        let hdc = gdi.create_dc("DISPLAY").unwrap();
        assert_eq!(gdi.set_bk_mode(hdc, BackgroundMode::Transparent).unwrap(), BackgroundMode::Opaque);
        assert_eq!(gdi.get_bk_mode(hdc).unwrap(), BackgroundMode::Transparent);
        assert_eq!(gdi.set_rop2(hdc, Rop2::XOR_PEN).unwrap(), Rop2::COPY_PEN);
        assert_eq!(gdi.set_text_color(hdc, ColorRef::rgb(9, 9, 9)).unwrap(), ColorRef::BLACK);
        assert_eq!(gdi.get_text_color(hdc).unwrap(), ColorRef::rgb(9, 9, 9));
        assert_eq!(gdi.set_text_align(hdc, TextAlign::UPDATE_CP).unwrap(), TextAlign::empty());
        assert!(gdi.set_miter_limit(hdc, f32::NAN).is_err());
        assert_eq!(gdi.set_miter_limit(hdc, 4.0).unwrap(), 10.0);
        assert_eq!(gdi.set_brush_org(hdc, Point::new(3, 4)).unwrap(), Point::default());
        assert_eq!(
            gdi.set_arc_direction(hdc, ArcDirection::Clockwise).unwrap(),
            ArcDirection::CounterClockwise
        );
        gdi.delete_dc(hdc).unwrap();
    }

    #[test]
    fn test_attributes_are_published_to_the_arena() {
        let gdi = gdi();
        let hdc = gdi.create_dc("DISPLAY").unwrap();
        gdi.set_bk_color(hdc, ColorRef::rgb(0x12, 0x34, 0x56)).unwrap();
        let (region, offset) = gdi.attribute_location(hdc).unwrap();
        let bytes = gdi.attribute_region(region).unwrap();
        let size = std::mem::size_of::<DcAttr>();
        let attr: DcAttr = bytemuck::pod_read_unaligned(&bytes[offset..offset + size]);
        assert_eq!(attr.hdc, hdc.raw());
        assert_eq!(attr.background_color, ColorRef::rgb(0x12, 0x34, 0x56));
        gdi.delete_dc(hdc).unwrap();
    }

    #[test]
    fn test_reset_keeps_surface() {
        let gdi = gdi();
        let hdc = gdi.create_compatible_dc(None).unwrap();
        let bitmap = gdi.create_bitmap(2, 2, 32).unwrap();
        let brush = gdi.create_solid_brush(ColorRef::rgb(5, 5, 5)).unwrap();
        gdi.select_object(hdc, bitmap).unwrap();
        gdi.select_object(hdc, brush).unwrap();
        gdi.save_dc(hdc).unwrap();
        gdi.set_bk_mode(hdc, BackgroundMode::Transparent).unwrap();

        gdi.reset_dc(hdc).unwrap();
        assert_eq!(gdi.get_save_level(hdc).unwrap(), 0);
        assert_eq!(gdi.get_bk_mode(hdc).unwrap(), BackgroundMode::Opaque);
        assert_eq!(gdi.get_current_object(hdc, ObjectType::Bitmap).unwrap(), bitmap);
        assert_eq!(gdi.ref_count(brush).unwrap(), 0);
        gdi.delete_dc(hdc).unwrap();
    }

    #[test]
    fn test_pop_layer_keeps_null_layer() {
        let gdi = gdi();
        let hdc = gdi.create_compatible_dc(None).unwrap();
        assert_eq!(gdi.layer_names(hdc).unwrap(), vec!["memory", "null"]);
        assert_eq!(gdi.pop_layer(hdc).unwrap(), Some("memory"));
        assert_eq!(gdi.pop_layer(hdc).unwrap(), None);
        assert_eq!(gdi.layer_names(hdc).unwrap(), vec!["null"]);
        gdi.delete_dc(hdc).unwrap();
    }
}
