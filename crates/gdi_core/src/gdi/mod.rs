//! The graphics service
//!
//! [`Gdi`] owns every process-wide structure: the handle table, the
//! attribute arena, the stock objects and the driver loader. It is built once,
//! shared by reference (or `Arc`) between threads, and torn down with
//! [`Gdi::shutdown`].
//!
//! Lock order is fixed: a device context's state is taken first, then the
//! handle table or the arena, each only briefly. References dropped while a
//! context is locked are queued on the context and released after it is
//! unlocked, since releasing may delete an object and notify other contexts.

mod dc_ops;
mod draw;
mod mapping;

use std::sync::Arc;

use crate::arena::{ArenaUsage, AttributeArena};
use crate::config::{ConfigSource, DpiSettings, GdiConfig, MemorySource};
use crate::dc::{DcGuard, DcState, DeviceContext};
use crate::driver::{BackendContext, BackendRegistry, DriverLoader};
use crate::error::{DeleteOutcome, GdiError, GdiResult};
use crate::foundation::color::ColorRef;
use crate::foundation::math::Rect;
use crate::foundation::sync::CheckedMutex;
use crate::handle::{Handle, HandleTable, ObjectType};
use crate::object::{
    Bitmap, BrushStyle, GdiObject, HatchStyle, LogBrush, LogFont, LogPen, ObjectBody, Palette, PaletteEntry, PenStyle,
    Region, StockObject, StockObjects,
};

/// Typed view of a table entry, `WrongType` when `view` rejects its body
fn fetch<T>(
    table: &HandleTable<GdiObject>,
    handle: Handle,
    expected: &'static str,
    view: impl FnOnce(&ObjectBody) -> Option<T>,
) -> GdiResult<T> {
    let object = table.lookup(handle).ok_or(GdiError::InvalidHandle(handle))?;
    view(&object.body).ok_or(GdiError::WrongType {
        handle,
        expected,
        found: object.object_type(),
    })
}

/// Service occupancy figures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GdiStats {
    /// Live handles, stock objects included
    pub live_handles: usize,
    /// Live handles per kind
    pub by_kind: Vec<(ObjectType, usize)>,
    /// Attribute arena occupancy
    pub arena: ArenaUsage,
    /// Whether the display driver has been loaded
    pub driver_loaded: bool,
}

impl GdiStats {
    /// Live handles of one kind
    pub fn count(&self, kind: ObjectType) -> usize {
        self.by_kind
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(0, |(_, count)| *count)
    }
}

/// The graphics service
pub struct Gdi {
    config: GdiConfig,
    table: CheckedMutex<HandleTable<GdiObject>>,
    arena: CheckedMutex<AttributeArena>,
    loader: Arc<DriverLoader>,
    stock: StockObjects,
    dpi: u32,
}

impl std::fmt::Debug for Gdi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gdi")
            .field("dpi", &self.dpi)
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

impl Gdi {
    /// Service with no external settings
    pub fn new(config: GdiConfig) -> GdiResult<Self> {
        Self::with_source(config, Box::new(MemorySource::new()))
    }

    /// Service reading display settings from `source`
    pub fn with_source(config: GdiConfig, source: Box<dyn ConfigSource>) -> GdiResult<Self> {
        Self::with_registry(config, source, BackendRegistry::with_defaults())
    }

    /// Service resolving its display driver from a custom registry
    pub fn with_registry(
        config: GdiConfig,
        source: Box<dyn ConfigSource>,
        registry: BackendRegistry,
    ) -> GdiResult<Self> {
        config.validate()?;
        let dpi = DpiSettings::new(source).dpi();

        let mut table = HandleTable::new(config.handles.capacity);
        let stock = StockObjects::create(&mut table)?;
        let context = BackendContext {
            display: config.display.clone(),
            dpi,
        };
        let loader = Arc::new(DriverLoader::new(registry, config.display.driver.clone(), context));

        log::info!(
            "Graphics service started: {} handle slots, driver {:?}, {} dpi",
            config.handles.capacity,
            config.display.driver,
            dpi
        );
        Ok(Self {
            arena: CheckedMutex::new("attribute arena", AttributeArena::new(&config.arena)),
            table: CheckedMutex::new("handle table", table),
            loader,
            stock,
            dpi,
            config,
        })
    }

    /// Configuration the service was built with
    pub fn config(&self) -> &GdiConfig {
        &self.config
    }

    /// Logical DPI read at startup
    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// The driver loader shared by display contexts
    pub fn loader(&self) -> &Arc<DriverLoader> {
        &self.loader
    }

    /// Current occupancy
    pub fn stats(&self) -> GdiStats {
        let mut by_kind: Vec<(ObjectType, usize)> = Vec::new();
        let live_handles = {
            let table = self.table.lock();
            for (_, object) in table.iter() {
                let kind = object.object_type();
                match by_kind.iter_mut().find(|(k, _)| *k == kind) {
                    Some((_, count)) => *count += 1,
                    None => by_kind.push((kind, 1)),
                }
            }
            table.len()
        };
        by_kind.sort_by_key(|(kind, _)| kind.tag());
        GdiStats {
            live_handles,
            by_kind,
            arena: self.arena.lock().usage(),
            driver_loaded: self.loader.is_loaded(),
        }
    }

    /// Tear the service down, returning the handles the caller never deleted
    pub fn shutdown(self) -> Vec<(Handle, ObjectType)> {
        let mut table = self.table.lock();
        let leaked: Vec<(Handle, ObjectType)> = table
            .iter()
            .filter(|(handle, _)| self.stock.identify(*handle).is_none())
            .map(|(handle, object)| (handle, object.object_type()))
            .collect();
        for (handle, kind) in &leaked {
            log::warn!("Leaked {:?} {}", kind, handle);
        }
        for handle in self.stock.handles() {
            table.free(handle);
        }
        log::info!("Graphics service stopped, {} leaked handles", leaked.len());
        leaked
    }

    // --- object creation

    fn insert(&self, object: GdiObject) -> GdiResult<Handle> {
        let kind = object.object_type();
        let mut table = self.table.lock();
        let handle = table.allocate(object, kind).map_err(|_| GdiError::OutOfHandles {
            capacity: table.capacity(),
        })?;
        log::trace!("Created {:?} {}", kind, handle);
        Ok(handle)
    }

    /// Create a cosmetic pen
    pub fn create_pen(&self, style: PenStyle, width: i32, color: ColorRef) -> GdiResult<Handle> {
        if width < 0 {
            return Err(GdiError::invalid(format!("negative pen width {width}")));
        }
        self.insert(GdiObject::new(ObjectBody::Pen(LogPen::new(style, width, color))))
    }

    /// Create a solid brush
    pub fn create_solid_brush(&self, color: ColorRef) -> GdiResult<Handle> {
        self.insert(GdiObject::new(ObjectBody::Brush(LogBrush::solid(color))))
    }

    /// Create a hatched brush
    pub fn create_hatch_brush(&self, hatch: HatchStyle, color: ColorRef) -> GdiResult<Handle> {
        self.insert(GdiObject::new(ObjectBody::Brush(LogBrush {
            style: BrushStyle::Hatched(hatch),
            color,
        })))
    }

    /// Create a font from its logical description
    pub fn create_font(&self, font: LogFont) -> GdiResult<Handle> {
        self.insert(GdiObject::new(ObjectBody::Font(font)))
    }

    /// Create a black bitmap
    pub fn create_bitmap(&self, width: i32, height: i32, bits_per_pixel: i32) -> GdiResult<Handle> {
        if width <= 0 || height <= 0 {
            return Err(GdiError::invalid(format!("bitmap size {width}x{height}")));
        }
        if ![1, 4, 8, 16, 24, 32].contains(&bits_per_pixel) {
            return Err(GdiError::invalid(format!("{bits_per_pixel} bits per pixel")));
        }
        self.insert(GdiObject::new(ObjectBody::Bitmap(Bitmap::new(width, height, bits_per_pixel))))
    }

    /// Create a rectangular region
    pub fn create_rect_region(&self, rect: Rect) -> GdiResult<Handle> {
        self.insert(GdiObject::new(ObjectBody::Region(Region::from_rect(rect))))
    }

    /// Create a logical palette
    pub fn create_palette(&self, entries: Vec<PaletteEntry>) -> GdiResult<Handle> {
        if entries.is_empty() {
            return Err(GdiError::invalid("empty palette"));
        }
        self.insert(GdiObject::new(ObjectBody::Palette(Palette { entries })))
    }

    // --- object queries

    /// Kind of the object behind `handle`
    pub fn get_object_type(&self, handle: Handle) -> GdiResult<ObjectType> {
        self.table.lock().kind(handle).ok_or(GdiError::InvalidHandle(handle))
    }

    /// Handle of a stock object
    pub fn get_stock_object(&self, stock: StockObject) -> Handle {
        self.stock.get(stock)
    }

    /// Canonical handle for a possibly short one
    pub fn promote(&self, handle: Handle) -> GdiResult<Handle> {
        self.table.lock().promote(handle).ok_or(GdiError::InvalidHandle(handle))
    }

    /// Selection count of an object
    pub fn ref_count(&self, handle: Handle) -> GdiResult<u32> {
        self.with_object(handle, |object| object.header.selcount)
    }

    /// Copy of an object's description
    pub fn get_object(&self, handle: Handle) -> GdiResult<ObjectBody> {
        self.with_object(handle, |object| object.body.clone())
    }

    /// Protect an object from deletion, or lift the protection
    pub fn make_object_system(&self, handle: Handle, system: bool) -> GdiResult<()> {
        self.with_object(handle, |object| object.header.system = system)
    }

    fn with_object<R>(&self, handle: Handle, f: impl FnOnce(&mut GdiObject) -> R) -> GdiResult<R> {
        let mut table = self.table.lock();
        table
            .lookup_mut(handle)
            .map(f)
            .ok_or(GdiError::InvalidHandle(handle))
    }

    // --- reference counting

    /// Take a selection reference; returns the new count
    ///
    /// Device contexts are not reference counted this way.
    pub fn acquire_ref(&self, handle: Handle) -> GdiResult<u32> {
        let mut table = self.table.lock();
        let object = table.lookup_mut(handle).ok_or(GdiError::InvalidHandle(handle))?;
        if object.object_type().is_dc() {
            return Err(GdiError::WrongType {
                handle,
                expected: "selectable object",
                found: object.object_type(),
            });
        }
        object.header.selcount += 1;
        Ok(object.header.selcount)
    }

    /// Drop a selection reference; returns the remaining count
    ///
    /// Dropping the last reference of an object whose deletion was deferred
    /// deletes it here.
    pub fn release_ref(&self, handle: Handle) -> GdiResult<u32> {
        let removed = {
            let mut table = self.table.lock();
            let object = table.lookup_mut(handle).ok_or(GdiError::InvalidHandle(handle))?;
            if object.header.selcount == 0 {
                return Err(GdiError::invalid(format!("{handle} has no references to release")));
            }
            object.header.selcount -= 1;
            if !object.header.ready_for_delete() {
                return Ok(object.header.selcount);
            }
            log::debug!("Last reference to {} dropped, running deferred delete", handle);
            table.free(handle)
        };
        if let Some(object) = removed {
            self.destroy(handle, &object);
        }
        Ok(0)
    }

    fn add_refs(&self, handles: &[Handle]) {
        let mut table = self.table.lock();
        for handle in handles {
            match table.lookup_mut(*handle) {
                Some(object) => object.header.selcount += 1,
                None => log::warn!("Cannot reference {}: no such object", handle),
            }
        }
    }

    fn release_all(&self, handles: &[Handle]) {
        for handle in handles.iter().filter(|h| !h.is_null()) {
            if let Err(err) = self.release_ref(*handle) {
                log::warn!("Releasing {}: {}", handle, err);
            }
        }
    }

    /// Delete an object, or schedule its deletion if it is still selected
    pub fn delete_object(&self, handle: Handle) -> GdiResult<DeleteOutcome> {
        if self.get_object_type(handle)?.is_dc() {
            return self.delete_dc(handle).map(|()| DeleteOutcome::Deleted);
        }

        let removed = {
            let mut table = self.table.lock();
            let object = table.lookup_mut(handle).ok_or(GdiError::InvalidHandle(handle))?;
            if object.header.system {
                return Ok(DeleteOutcome::Protected);
            }
            if object.header.selcount > 0 {
                object.header.pending_delete = true;
                log::debug!(
                    "{} {} still selected {} time(s), delete deferred",
                    object.body.kind_name(),
                    handle,
                    object.header.selcount
                );
                return Ok(DeleteOutcome::Deferred);
            }
            table.free(handle)
        };
        if let Some(object) = removed {
            self.destroy(handle, &object);
        }
        Ok(DeleteOutcome::Deleted)
    }

    /// Tell the contexts that used a freed object to forget it
    fn destroy(&self, handle: Handle, object: &GdiObject) {
        log::trace!("Destroying {} {}", object.body.kind_name(), handle);
        for hdc in object.header.users() {
            let Ok(dc) = self.dc_arc(*hdc) else {
                continue;
            };
            if dc.is_deleted() {
                continue;
            }
            match dc.try_state() {
                Some(mut state) => {
                    state.forget_registered(handle);
                    state.chain().head().delete_object(handle);
                }
                None => log::debug!("Device context {} busy, skipped delete notification for {}", hdc, handle),
            };
        }
    }

    /// Register `hdc` for delete notification on `object`
    pub fn add_object_user(&self, object: Handle, hdc: Handle) -> GdiResult<()> {
        self.dc_arc(hdc)?;
        self.with_object(object, |o| o.header.add_user(hdc))
    }

    /// Stop notifying `hdc`; returns whether it was registered
    pub fn remove_object_user(&self, object: Handle, hdc: Handle) -> GdiResult<bool> {
        self.with_object(object, |o| o.header.remove_user(hdc))
    }

    /// Users registered on an object
    pub fn object_users(&self, object: Handle) -> GdiResult<Vec<Handle>> {
        self.with_object(object, |o| o.header.users().to_vec())
    }

    // --- device context access

    pub(crate) fn dc_arc(&self, hdc: Handle) -> GdiResult<Arc<DeviceContext>> {
        let table = self.table.lock();
        match table.lookup(hdc) {
            Some(GdiObject {
                body: ObjectBody::Dc(dc),
                ..
            }) => Ok(Arc::clone(dc)),
            Some(other) => Err(GdiError::WrongType {
                handle: hdc,
                expected: "device context",
                found: other.object_type(),
            }),
            None => Err(GdiError::InvalidHandle(hdc)),
        }
    }

    /// Claim a device context for the calling thread
    ///
    /// Other threads are refused until the guard is dropped.
    pub fn lock_dc(&self, hdc: Handle) -> GdiResult<DcGuard> {
        DcGuard::acquire(self.dc_arc(hdc)?)
    }

    /// Run `f` on a context's state with the calling thread as owner
    fn with_dc<R>(&self, hdc: Handle, f: impl FnOnce(&mut DcState) -> GdiResult<R>) -> GdiResult<R> {
        let guard = self.lock_dc(hdc)?;
        let (result, released) = {
            let mut state = guard.dc().state()?;
            let result = f(&mut state);
            self.publish(&state);
            (result, state.take_released())
        };
        drop(guard);
        self.release_all(&released);
        result
    }

    /// Copy a context's attributes into its arena block
    fn publish(&self, state: &DcState) {
        if let Err(err) = self.arena.lock().write(state.block(), *state.attr()) {
            log::warn!("Publishing attributes of {:#x}: {}", state.attr().hdc, err);
        }
    }

    /// Byte image of an attribute arena region, as an external reader sees it
    pub fn attribute_region(&self, region: usize) -> Option<Vec<u8>> {
        self.arena.lock().region_bytes(region).map(<[u8]>::to_vec)
    }

    /// Region and byte offset of a context's attribute block
    pub fn attribute_location(&self, hdc: Handle) -> GdiResult<(usize, usize)> {
        let block = self.with_dc(hdc, |state| Ok(state.block()))?;
        self.arena
            .lock()
            .block_offset(block)
            .ok_or(GdiError::InvalidBlock(block.index()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TomlSource;

    fn gdi() -> Gdi {
        Gdi::new(GdiConfig::default()).unwrap()
    }

    #[test]
    fn test_stock_objects_are_protected() {
        let gdi = gdi();
        let brush = gdi.get_stock_object(StockObject::WhiteBrush);
        assert_eq!(gdi.get_object_type(brush).unwrap(), ObjectType::Brush);
        assert_eq!(gdi.delete_object(brush).unwrap(), DeleteOutcome::Protected);
        assert_eq!(gdi.get_object_type(brush).unwrap(), ObjectType::Brush);

        gdi.make_object_system(brush, false).unwrap();
        assert_eq!(gdi.delete_object(brush).unwrap(), DeleteOutcome::Deleted);
        assert!(matches!(gdi.get_object_type(brush), Err(GdiError::InvalidHandle(_))));
    }

    #[test]
    fn test_create_validates_arguments() {
        let gdi = gdi();
        assert!(gdi.create_pen(PenStyle::Solid, -1, ColorRef::BLACK).is_err());
        assert!(gdi.create_bitmap(0, 4, 32).is_err());
        assert!(gdi.create_bitmap(4, 4, 7).is_err());
        assert!(gdi.create_palette(Vec::new()).is_err());
        let pen = gdi.create_pen(PenStyle::Dash, 2, ColorRef::BLACK).unwrap();
        assert!(matches!(gdi.get_object(pen).unwrap(), ObjectBody::Pen(p) if p.width == 2));
    }

    #[test]
    fn test_release_below_zero_fails() {
        let gdi = gdi();
        let brush = gdi.create_solid_brush(ColorRef::WHITE).unwrap();
        assert!(gdi.release_ref(brush).is_err());
        assert_eq!(gdi.acquire_ref(brush).unwrap(), 1);
        assert_eq!(gdi.release_ref(brush).unwrap(), 0);
        assert_eq!(gdi.ref_count(brush).unwrap(), 0);
    }

    #[test]
    fn test_delete_unknown_handle_fails() {
        let gdi = gdi();
        let before = gdi.stats();
        assert!(matches!(
            gdi.delete_object(Handle::new(4000, 3)),
            Err(GdiError::InvalidHandle(_))
        ));
        assert_eq!(gdi.stats(), before);
    }

    #[test]
    fn test_out_of_handles() {
        let config = GdiConfig::default().with_handle_capacity(usize::from(crate::handle::FIRST_HANDLE_INDEX) + 21);
        let gdi = Gdi::new(config).unwrap();
        gdi.create_solid_brush(ColorRef::BLACK).unwrap();
        assert!(matches!(
            gdi.create_solid_brush(ColorRef::BLACK),
            Err(GdiError::OutOfHandles { .. })
        ));
    }

    #[test]
    fn test_dpi_comes_from_source() {
        let source = TomlSource::parse("[Desktop]\nLogPixels = \"144\"\n").unwrap();
        let gdi = Gdi::with_source(GdiConfig::default(), Box::new(source)).unwrap();
        assert_eq!(gdi.dpi(), 144);
    }

    #[test]
    fn test_shutdown_reports_leaks() {
        let gdi = gdi();
        let pen = gdi.create_pen(PenStyle::Solid, 1, ColorRef::BLACK).unwrap();
        let leaked = gdi.shutdown();
        assert_eq!(leaked, vec![(pen, ObjectType::Pen)]);
    }

    #[test]
    fn test_stats_count_kinds() {
        let gdi = gdi();
        gdi.create_font(LogFont::new("Mono", 12)).unwrap();
        let stats = gdi.stats();
        assert_eq!(stats.count(ObjectType::Font), 8);
        assert_eq!(stats.live_handles, StockObject::ALL.len() + 1);
        assert!(!stats.driver_loaded);
    }
}
