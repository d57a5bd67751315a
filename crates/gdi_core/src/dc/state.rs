//! Mutable device context state and the save stack

use crate::arena::{AttrBlock, AttributeArena, DcAttr, DC_ATTR_VERSION};
use crate::driver::DeviceChain;
use crate::error::{GdiError, GdiResult};
use crate::foundation::color::ColorRef;
use crate::foundation::math::{Rect, Size, Xform};
use crate::foundation::sync::CheckedMutex;
use crate::handle::{Handle, ObjectType};
use crate::object::{Bitmap, LogBrush, LogFont, LogPen, Region};

use super::modes::{
    ArcDirection, BackgroundMode, GraphicsMode, MapMode, PolyFillMode, RelAbsMode, Rop2, StretchMode,
};
use super::path::Path;
use super::xform::Transforms;

/// An object selected into a context, with the description its layers were given
#[derive(Debug, Clone)]
pub struct Selected<T> {
    /// Object handle
    pub handle: Handle,
    /// Description at selection time
    pub object: T,
}

impl<T> Selected<T> {
    /// Pair a handle with its description
    pub fn new(handle: Handle, object: T) -> Self {
        Self { handle, object }
    }
}

/// Objects currently selected into a context
///
/// Each handle here holds one reference on its object.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Current pen
    pub pen: Selected<LogPen>,
    /// Current brush
    pub brush: Selected<LogBrush>,
    /// Current font
    pub font: Selected<LogFont>,
    /// Current palette
    pub palette: Handle,
    /// Current surface; memory contexts only
    pub bitmap: Option<Selected<Bitmap>>,
}

impl Selection {
    /// Every handle the selection holds a reference on
    pub fn handles(&self) -> Vec<Handle> {
        let mut handles = vec![self.pen.handle, self.brush.handle, self.font.handle, self.palette];
        handles.extend(self.bitmap.as_ref().map(|bitmap| bitmap.handle));
        handles
    }
}

/// Stock objects whose color follows the context attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DcStock {
    /// `DC_BRUSH`
    pub brush: Handle,
    /// `DC_PEN`
    pub pen: Handle,
}

#[derive(Debug)]
struct SavedState {
    block: AttrBlock,
    selection: Selection,
    world: Xform,
    clip: Option<Region>,
    meta: Option<Region>,
    path: Option<Path>,
}

/// Attributes of a freshly created or reset context
pub fn initial_attr() -> DcAttr {
    DcAttr {
        version: DC_ATTR_VERSION,
        map_mode: MapMode::Text as u32,
        graphics_mode: GraphicsMode::Compatible as u32,
        window_ext: Size::new(1, 1),
        viewport_ext: Size::new(1, 1),
        background_color: ColorRef::WHITE,
        text_color: ColorRef::BLACK,
        brush_color: ColorRef::WHITE,
        pen_color: ColorRef::BLACK,
        background_mode: BackgroundMode::Opaque as u32,
        rop2: Rop2::COPY_PEN.raw(),
        poly_fill_mode: PolyFillMode::Alternate as u32,
        stretch_blt_mode: StretchMode::BlackOnWhite as u32,
        rel_abs_mode: RelAbsMode::Absolute as u32,
        arc_direction: ArcDirection::CounterClockwise as u32,
        miter_limit: 10.0,
        ..DcAttr::default()
    }
}

/// Everything about a context that changes after creation
///
/// `attr` mirrors the context's arena block; callers publish it back after
/// each operation. Handles whose references must be dropped are queued in a
/// release list and handed back through [`take_released`](Self::take_released),
/// because releasing may notify other contexts and must not happen while this
/// state is locked.
#[derive(Debug)]
pub struct DcState {
    kind: ObjectType,
    block: AttrBlock,
    pub(super) attr: DcAttr,
    selection: Selection,
    dc_stock: DcStock,
    saved: Vec<SavedState>,
    pub(super) transforms: Transforms,
    pub(super) epsilon: f64,
    pub(super) vis_rect: Rect,
    pub(super) clip: Option<Region>,
    pub(super) meta: Option<Region>,
    path: Option<Path>,
    pub(super) bounds: Rect,
    pub(super) bounds_enabled: bool,
    pub(super) chain: DeviceChain,
    registered: Vec<Handle>,
    released: Vec<Handle>,
}

impl DcState {
    /// Build the state of a new context and realize its selection in `chain`
    ///
    /// `selection` must already hold its references.
    pub fn new(
        kind: ObjectType,
        block: AttrBlock,
        selection: Selection,
        dc_stock: DcStock,
        vis_rect: Rect,
        chain: DeviceChain,
        epsilon: f64,
    ) -> Self {
        let mut state = Self {
            kind,
            block,
            attr: initial_attr(),
            selection,
            dc_stock,
            saved: Vec::new(),
            transforms: Transforms::default(),
            epsilon,
            vis_rect,
            clip: None,
            meta: None,
            path: None,
            bounds: Rect::EMPTY,
            bounds_enabled: false,
            chain,
            registered: Vec::new(),
            released: Vec::new(),
        };
        state.transforms.update(&state.attr, &state.vis_rect, epsilon);
        state.realize_selection();
        state
    }

    /// Context kind
    pub fn kind(&self) -> ObjectType {
        self.kind
    }

    /// Whether this is a memory context
    pub fn is_memory(&self) -> bool {
        self.kind == ObjectType::MemDc
    }

    /// Arena block of the current level
    pub fn block(&self) -> AttrBlock {
        self.block
    }

    /// Current attributes
    pub fn attr(&self) -> &DcAttr {
        &self.attr
    }

    /// Mutable attributes, for fields with no side effects
    pub(crate) fn attr_mut(&mut self) -> &mut DcAttr {
        &mut self.attr
    }

    /// Record the owning handle in the attributes
    pub(crate) fn bind(&mut self, hdc: Handle) {
        self.attr.hdc = hdc.raw();
    }

    /// Number of saved levels
    pub fn save_level(&self) -> i32 {
        self.attr.save_level
    }

    /// Current selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Cached transforms
    pub fn transforms(&self) -> &Transforms {
        &self.transforms
    }

    /// Visible area in device units
    pub fn vis_rect(&self) -> Rect {
        self.vis_rect
    }

    /// Dispatch chain
    pub fn chain(&mut self) -> &mut DeviceChain {
        &mut self.chain
    }

    /// Recorded path, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    /// Mutable path slot
    pub(crate) fn path_mut(&mut self) -> &mut Option<Path> {
        &mut self.path
    }

    /// Handles whose references should now be dropped
    pub fn take_released(&mut self) -> Vec<Handle> {
        std::mem::take(&mut self.released)
    }

    /// Remember an object this context registered itself with
    pub(crate) fn note_registered(&mut self, object: Handle) {
        if !self.registered.contains(&object) {
            self.registered.push(object);
        }
    }

    /// Drop a freed object from the registrations; returns whether it was there
    pub(crate) fn forget_registered(&mut self, object: Handle) -> bool {
        let before = self.registered.len();
        self.registered.retain(|h| *h != object);
        self.registered.len() != before
    }

    /// Objects this context is registered with for delete notification
    pub fn registered(&self) -> &[Handle] {
        &self.registered
    }

    /// Queue a reference to be dropped after the state is unlocked
    pub(crate) fn queue_release(&mut self, handle: Handle) {
        self.released.push(handle);
    }

    /// Recompute transforms; pens and fonts are realized again if the scale changed
    pub fn update_xforms(&mut self) {
        if self.transforms.update(&self.attr, &self.vis_rect, self.epsilon) {
            self.realize_font();
            self.realize_pen();
        }
    }

    fn effective_pen(&self) -> LogPen {
        let mut pen = self.selection.pen.object;
        if self.selection.pen.handle == self.dc_stock.pen {
            pen.color = self.attr.pen_color;
        }
        pen
    }

    fn effective_brush(&self) -> LogBrush {
        let mut brush = self.selection.brush.object;
        if self.selection.brush.handle == self.dc_stock.brush {
            brush.color = self.attr.brush_color;
        }
        brush
    }

    fn realize_pen(&mut self) -> bool {
        let pen = self.effective_pen();
        let handle = self.selection.pen.handle;
        self.chain.head().select_pen(handle, &pen)
    }

    fn realize_brush(&mut self) -> bool {
        let brush = self.effective_brush();
        let handle = self.selection.brush.handle;
        self.chain.head().select_brush(handle, &brush)
    }

    fn realize_font(&mut self) -> bool {
        let Self { chain, selection, .. } = self;
        chain.head().select_font(selection.font.handle, &selection.font.object)
    }

    /// Hand the whole selection and the text colors to the layers again
    fn realize_selection(&mut self) {
        let Self { chain, selection, .. } = self;
        if let Some(bitmap) = &selection.bitmap {
            chain.head().select_bitmap(bitmap.handle, &bitmap.object);
        }
        let realized = self.realize_brush() & self.realize_font() & self.realize_pen();
        if !realized {
            log::debug!("Device context {:#x}: a layer refused a reselection", self.attr.hdc);
        }
        self.chain.head().set_bk_color(self.attr.background_color);
        self.chain.head().set_text_color(self.attr.text_color);
        let palette = self.selection.palette;
        self.chain.head().select_palette(palette, false);
    }

    // --- selection

    /// Select a pen; the new handle's reference is consumed either way
    pub fn select_pen(&mut self, pen: Selected<LogPen>) -> GdiResult<Handle> {
        let previous = std::mem::replace(&mut self.selection.pen, pen);
        if self.realize_pen() {
            self.released.push(previous.handle);
            Ok(previous.handle)
        } else {
            let rejected = std::mem::replace(&mut self.selection.pen, previous);
            self.released.push(rejected.handle);
            Err(GdiError::Unsupported("pen rejected by device"))
        }
    }

    /// Select a brush; the new handle's reference is consumed either way
    pub fn select_brush(&mut self, brush: Selected<LogBrush>) -> GdiResult<Handle> {
        let previous = std::mem::replace(&mut self.selection.brush, brush);
        if self.realize_brush() {
            self.released.push(previous.handle);
            Ok(previous.handle)
        } else {
            let rejected = std::mem::replace(&mut self.selection.brush, previous);
            self.released.push(rejected.handle);
            Err(GdiError::Unsupported("brush rejected by device"))
        }
    }

    /// Select a font; the new handle's reference is consumed either way
    pub fn select_font(&mut self, font: Selected<LogFont>) -> GdiResult<Handle> {
        let previous = std::mem::replace(&mut self.selection.font, font);
        if self.realize_font() {
            self.released.push(previous.handle);
            Ok(previous.handle)
        } else {
            let rejected = std::mem::replace(&mut self.selection.font, previous);
            self.released.push(rejected.handle);
            Err(GdiError::Unsupported("font rejected by device"))
        }
    }

    /// Select the surface of a memory context
    ///
    /// The visible area becomes the bitmap's extent.
    pub fn select_bitmap(&mut self, bitmap: Selected<Bitmap>) -> GdiResult<Handle> {
        if !self.is_memory() || !self.chain.head().select_bitmap(bitmap.handle, &bitmap.object) {
            self.released.push(bitmap.handle);
            return Err(GdiError::Unsupported("bitmap selection needs a memory context"));
        }
        self.vis_rect = bitmap.object.rect();
        let previous = self.selection.bitmap.replace(bitmap).map_or(Handle::NULL, |b| b.handle);
        self.released.push(previous);
        self.update_xforms();
        Ok(previous)
    }

    /// Select a palette; the new handle's reference is consumed either way
    pub fn select_palette(&mut self, palette: Handle, background: bool) -> GdiResult<Handle> {
        if !self.chain.head().select_palette(palette, background) {
            self.released.push(palette);
            return Err(GdiError::Unsupported("palette rejected by device"));
        }
        let previous = std::mem::replace(&mut self.selection.palette, palette);
        self.released.push(previous);
        Ok(previous)
    }

    // --- attributes routed through the layers

    /// Set the background color, returning the previous one
    pub fn set_bk_color(&mut self, color: ColorRef) -> GdiResult<ColorRef> {
        let stored = self.chain.head().set_bk_color(color);
        if stored == ColorRef::INVALID {
            return Err(GdiError::Unsupported("background color"));
        }
        Ok(std::mem::replace(&mut self.attr.background_color, stored))
    }

    /// Set the text color, returning the previous one
    pub fn set_text_color(&mut self, color: ColorRef) -> GdiResult<ColorRef> {
        let stored = self.chain.head().set_text_color(color);
        if stored == ColorRef::INVALID {
            return Err(GdiError::Unsupported("text color"));
        }
        Ok(std::mem::replace(&mut self.attr.text_color, stored))
    }

    /// Set the `DC_BRUSH` color, returning the previous one
    pub fn set_dc_brush_color(&mut self, color: ColorRef) -> GdiResult<ColorRef> {
        let stored = self.chain.head().set_dc_brush_color(color);
        if stored == ColorRef::INVALID {
            return Err(GdiError::Unsupported("DC brush color"));
        }
        let previous = std::mem::replace(&mut self.attr.brush_color, stored);
        if self.selection.brush.handle == self.dc_stock.brush {
            self.realize_brush();
        }
        Ok(previous)
    }

    /// Set the `DC_PEN` color, returning the previous one
    pub fn set_dc_pen_color(&mut self, color: ColorRef) -> GdiResult<ColorRef> {
        let stored = self.chain.head().set_dc_pen_color(color);
        if stored == ColorRef::INVALID {
            return Err(GdiError::Unsupported("DC pen color"));
        }
        let previous = std::mem::replace(&mut self.attr.pen_color, stored);
        if self.selection.pen.handle == self.dc_stock.pen {
            self.realize_pen();
        }
        Ok(previous)
    }

    /// Set the arc direction, returning the previous one
    pub fn set_arc_direction(&mut self, direction: ArcDirection) -> GdiResult<ArcDirection> {
        let stored = self.chain.head().set_arc_direction(direction as u32);
        let stored = ArcDirection::from_raw(stored).ok_or(GdiError::Unsupported("arc direction"))?;
        let previous = std::mem::replace(&mut self.attr.arc_direction, stored as u32);
        Ok(ArcDirection::from_raw(previous).unwrap_or(ArcDirection::CounterClockwise))
    }

    // --- save stack

    /// Push a copy of the current level; returns the new save level
    ///
    /// The copy keeps its own references on the selected objects; the
    /// returned handles are the ones the caller must acquire for it.
    pub fn save(&mut self, arena: &CheckedMutex<AttributeArena>) -> GdiResult<(i32, Vec<Handle>)> {
        let block = {
            let mut arena = arena.lock();
            let block = arena.alloc()?;
            arena.write(block, self.attr)?;
            block
        };

        let level = self.attr.save_level + 1;
        if !self.chain.head().save_dc(level) {
            arena.lock().free(block)?;
            return Err(GdiError::Unsupported("save refused by device"));
        }

        self.saved.push(SavedState {
            block,
            selection: self.selection.clone(),
            world: self.transforms.world,
            clip: self.clip.clone(),
            meta: self.meta.clone(),
            path: self.path.clone(),
        });
        self.attr.save_level = level;
        Ok((level, self.selection.handles()))
    }

    /// Return to a saved level and discard every level above it
    ///
    /// `level` counts from the bottom when positive and back from the current
    /// level when negative. Out of range levels fail without changes.
    pub fn restore(&mut self, level: i32, arena: &CheckedMutex<AttributeArena>) -> GdiResult<()> {
        let current = self.attr.save_level;
        if level == 0 || level.unsigned_abs() > current.unsigned_abs() {
            log::debug!("Device context {:#x}: no save level {} (depth {})", self.attr.hdc, level, current);
            return Err(GdiError::InvalidSaveLevel {
                requested: level,
                current,
            });
        }
        let target = if level < 0 { current + level + 1 } else { level };
        // target is in 1..=current, and saved has exactly `current` entries
        let index = (target - 1) as usize;

        let saved_attr = arena.lock().read(self.saved[index].block)?;
        if !self.chain.head().restore_dc(target) {
            return Err(GdiError::Unsupported("restore refused by device"));
        }

        let mut popped = self.saved.split_off(index).into_iter();
        let Some(restored) = popped.next() else {
            return Err(GdiError::InvalidSaveLevel {
                requested: level,
                current,
            });
        };

        let hdc = self.attr.hdc;
        self.attr = DcAttr {
            hdc,
            save_level: target - 1,
            ..saved_attr
        };
        self.clip = restored.clip;
        self.meta = restored.meta;
        self.path = restored.path;
        self.transforms.world = restored.world;
        if let Some(bitmap) = &restored.selection.bitmap {
            self.vis_rect = bitmap.object.rect();
        }
        self.transforms.update(&self.attr, &self.vis_rect, self.epsilon);

        let replaced = std::mem::replace(&mut self.selection, restored.selection);
        self.released.extend(replaced.handles());
        self.realize_selection();

        let mut blocks = vec![restored.block];
        for discarded in popped {
            self.released.extend(discarded.selection.handles());
            blocks.push(discarded.block);
        }
        let mut arena = arena.lock();
        for block in blocks {
            arena.free(block)?;
        }
        Ok(())
    }

    /// Drop every saved level, releasing their blocks
    fn discard_saved(&mut self, arena: &mut AttributeArena) {
        for saved in self.saved.drain(..) {
            self.released.extend(saved.selection.handles());
            if let Err(err) = arena.free(saved.block) {
                log::warn!("Freeing saved attributes: {}", err);
            }
        }
        self.attr.save_level = 0;
    }

    /// Return to the creation defaults
    ///
    /// `defaults` supplies the stock pen, brush, font and palette with their
    /// references already taken; the surface of a memory context stays.
    pub fn reset(&mut self, defaults: Selection, arena: &CheckedMutex<AttributeArena>) {
        self.discard_saved(&mut arena.lock());

        let hdc = self.attr.hdc;
        self.attr = DcAttr {
            hdc,
            ..initial_attr()
        };
        self.transforms.world = Xform::IDENTITY;
        self.clip = None;
        self.meta = None;
        self.path = None;
        self.bounds = Rect::EMPTY;
        self.bounds_enabled = false;
        self.transforms.update(&self.attr, &self.vis_rect, self.epsilon);

        let bitmap = self.selection.bitmap.take();
        let replaced = std::mem::replace(&mut self.selection, Selection { bitmap, ..defaults });
        self.released.extend(replaced.handles());
        self.realize_selection();
    }

    /// Release everything the context owns ahead of deletion
    ///
    /// Layers are deleted outermost first and every arena block is freed.
    /// Returns the objects the context had registered itself with.
    pub(crate) fn teardown(&mut self, arena: &CheckedMutex<AttributeArena>) -> Vec<Handle> {
        self.chain.teardown();
        self.path = None;
        self.clip = None;
        self.meta = None;

        let mut arena = arena.lock();
        self.discard_saved(&mut arena);
        if let Err(err) = arena.free(self.block) {
            log::warn!("Freeing attributes of {:#x}: {}", self.attr.hdc, err);
        }
        drop(arena);

        self.released.extend(self.selection.handles());
        std::mem::take(&mut self.registered)
    }
}
