//! Fixed-capacity generational slot table

use super::{next_generation, Handle, ObjectType, FIRST_HANDLE_INDEX, INVALID_GENERATION, MAX_HANDLE_CAPACITY};

/// Public metadata of a live slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotInfo {
    /// Object type tag
    pub kind: ObjectType,
    /// Extended type tag, opaque to the table
    pub ext: u16,
    /// Generation the slot was allocated with
    pub generation: u16,
}

#[derive(Debug)]
enum Slot<T> {
    Free { next: Option<u16> },
    Live { info: SlotInfo, object: T },
}

#[derive(Debug)]
struct Entry<T> {
    generation: u16,
    slot: Slot<T>,
}

/// Process-wide table mapping handles to objects
///
/// Slots below [`FIRST_HANDLE_INDEX`] are reserved. Fresh slots are taken from
/// the free list first and then from a high-water mark that only moves up.
/// Each allocation bumps the slot's generation, so handles to a freed slot
/// stop resolving as soon as the slot is reused.
///
/// The table itself is not synchronized; the service keeps it behind a
/// [`CheckedMutex`](crate::foundation::sync::CheckedMutex).
#[derive(Debug)]
pub struct HandleTable<T> {
    entries: Vec<Entry<T>>,
    capacity: usize,
    first_free: Option<u16>,
    live: usize,
}

impl<T> HandleTable<T> {
    /// Create a table addressing `capacity` slots, clamped to the 16-bit index range
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_HANDLE_CAPACITY);
        Self {
            entries: Vec::with_capacity(capacity.saturating_sub(usize::from(FIRST_HANDLE_INDEX))),
            capacity,
            first_free: None,
            live: 0,
        }
    }

    /// Total slot count, including the reserved range
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether the table holds no live objects
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Highest slot index ever handed out plus one
    pub fn high_water(&self) -> usize {
        usize::from(FIRST_HANDLE_INDEX) + self.entries.len()
    }

    /// Store `object` and return its handle
    ///
    /// When every slot is in use the object is handed back in `Err`.
    pub fn allocate(&mut self, object: T, kind: ObjectType) -> Result<Handle, T> {
        self.allocate_with_ext(object, kind, 0)
    }

    /// Like [`allocate`](Self::allocate) with an extended type tag
    pub fn allocate_with_ext(&mut self, object: T, kind: ObjectType, ext: u16) -> Result<Handle, T> {
        let index = match self.first_free {
            Some(index) => index,
            None => {
                let next = self.high_water();
                if next >= self.capacity {
                    log::warn!("Handle table full ({} slots)", self.capacity);
                    return Err(object);
                }
                self.entries.push(Entry {
                    generation: INVALID_GENERATION,
                    slot: Slot::Free { next: None },
                });
                // bounded by MAX_HANDLE_CAPACITY
                next as u16
            }
        };

        let entry = &mut self.entries[usize::from(index - FIRST_HANDLE_INDEX)];
        if let Slot::Free { next } = entry.slot {
            if self.first_free == Some(index) {
                self.first_free = next;
            }
        }

        entry.generation = next_generation(entry.generation);
        let info = SlotInfo {
            kind,
            ext,
            generation: entry.generation,
        };
        entry.slot = Slot::Live { info, object };
        self.live += 1;

        Ok(Handle::new(index, info.generation))
    }

    fn entry(&self, handle: Handle) -> Option<&Entry<T>> {
        let index = handle.index().checked_sub(FIRST_HANDLE_INDEX)?;
        let entry = self.entries.get(usize::from(index))?;
        let live = matches!(entry.slot, Slot::Live { .. });
        let generation_ok = handle.is_short() || handle.generation() == entry.generation;
        (live && generation_ok).then_some(entry)
    }

    fn entry_mut(&mut self, handle: Handle) -> Option<&mut Entry<T>> {
        self.entry(handle)?;
        let index = handle.index() - FIRST_HANDLE_INDEX;
        self.entries.get_mut(usize::from(index))
    }

    /// Object behind `handle`, or `None` if the handle is stale, free or out of range
    ///
    /// A short handle matches whatever generation currently occupies its slot.
    pub fn lookup(&self, handle: Handle) -> Option<&T> {
        match &self.entry(handle)?.slot {
            Slot::Live { object, .. } => Some(object),
            Slot::Free { .. } => None,
        }
    }

    /// Mutable access to the object behind `handle`
    pub fn lookup_mut(&mut self, handle: Handle) -> Option<&mut T> {
        match &mut self.entry_mut(handle)?.slot {
            Slot::Live { object, .. } => Some(object),
            Slot::Free { .. } => None,
        }
    }

    /// Metadata of the slot behind `handle`
    pub fn info(&self, handle: Handle) -> Option<SlotInfo> {
        match &self.entry(handle)?.slot {
            Slot::Live { info, .. } => Some(*info),
            Slot::Free { .. } => None,
        }
    }

    /// Object type of the slot behind `handle`
    pub fn kind(&self, handle: Handle) -> Option<ObjectType> {
        self.info(handle).map(|info| info.kind)
    }

    /// Canonical full handle for a possibly short one
    pub fn promote(&self, handle: Handle) -> Option<Handle> {
        let entry = self.entry(handle)?;
        Some(Handle::new(handle.index(), entry.generation))
    }

    /// Release the slot and return the object it held
    ///
    /// The generation is left in place so that stale handles keep failing
    /// until the slot is reused with a new generation.
    pub fn free(&mut self, handle: Handle) -> Option<T> {
        let first_free = self.first_free;
        let entry = self.entry_mut(handle)?;
        let slot = std::mem::replace(&mut entry.slot, Slot::Free { next: first_free });
        self.first_free = Some(handle.index());
        self.live -= 1;
        match slot {
            Slot::Live { object, .. } => Some(object),
            Slot::Free { .. } => None,
        }
    }

    /// Iterate over the handles of every live slot
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.entries.iter().enumerate().filter_map(|(offset, entry)| match entry.slot {
            Slot::Live { .. } => {
                // offset < capacity - FIRST_HANDLE_INDEX
                let index = offset as u16 + FIRST_HANDLE_INDEX;
                Some(Handle::new(index, entry.generation))
            }
            Slot::Free { .. } => None,
        })
    }

    /// Iterate over every live object with its handle
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> + '_ {
        self.entries.iter().enumerate().filter_map(|(offset, entry)| match &entry.slot {
            Slot::Live { object, .. } => {
                let index = offset as u16 + FIRST_HANDLE_INDEX;
                Some((Handle::new(index, entry.generation), object))
            }
            Slot::Free { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::{FIRST_GENERATION, MAX_GENERATION};

    #[test]
    fn test_allocate_and_lookup() {
        let mut table = HandleTable::new(64);
        let pen = table.allocate("pen", ObjectType::Pen).unwrap();
        let brush = table.allocate_with_ext("brush", ObjectType::Brush, 7).unwrap();

        assert_eq!(pen.index(), FIRST_HANDLE_INDEX);
        assert_eq!(pen.generation(), FIRST_GENERATION);
        assert_eq!(table.lookup(pen), Some(&"pen"));
        assert_eq!(table.kind(brush), Some(ObjectType::Brush));
        assert_eq!(table.info(brush).unwrap().ext, 7);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_reserved_and_null_handles_never_resolve() {
        let mut table = HandleTable::new(64);
        table.allocate(1, ObjectType::Region).unwrap();
        assert!(table.lookup(Handle::NULL).is_none());
        assert!(table.lookup(Handle::new(FIRST_HANDLE_INDEX - 1, 1)).is_none());
        assert!(table.lookup(Handle::new(FIRST_HANDLE_INDEX + 5, 1)).is_none());
    }

    #[test]
    fn test_stale_handle_after_reuse() {
        let mut table = HandleTable::new(64);
        let first = table.allocate(1, ObjectType::Pen).unwrap();
        assert_eq!(table.free(first), Some(1));
        assert!(table.lookup(first).is_none());

        let second = table.allocate(2, ObjectType::Pen).unwrap();
        assert_eq!(second.index(), first.index());
        assert_ne!(second, first);
        assert!(table.lookup(first).is_none());
        assert_eq!(table.lookup(second), Some(&2));
        assert!(table.free(first).is_none());
    }

    #[test]
    fn test_generation_wraps_past_invalid() {
        let mut table = HandleTable::new(64);
        let mut handle = table.allocate((), ObjectType::Brush).unwrap();
        for _ in 0..u32::from(MAX_GENERATION) {
            table.free(handle).unwrap();
            handle = table.allocate((), ObjectType::Brush).unwrap();
            assert_ne!(handle.generation(), INVALID_GENERATION);
        }
        // one full cycle lands back on the first generation
        assert_eq!(handle.generation(), FIRST_GENERATION);
    }

    #[test]
    fn test_capacity_exhaustion() {
        let capacity = usize::from(FIRST_HANDLE_INDEX) + 3;
        let mut table = HandleTable::new(capacity);
        let handles: Vec<_> = (0..3).map(|i| table.allocate(i, ObjectType::Font).unwrap()).collect();
        assert_eq!(table.allocate(99, ObjectType::Font), Err(99));

        table.free(handles[1]).unwrap();
        let reused = table.allocate(42, ObjectType::Font).unwrap();
        assert_eq!(reused.index(), handles[1].index());
        assert_eq!(table.high_water(), capacity);
    }

    #[test]
    fn test_short_handle_promotion() {
        let mut table = HandleTable::new(64);
        let stale = table.allocate("old", ObjectType::Bitmap).unwrap();
        table.free(stale).unwrap();
        let full = table.allocate("new", ObjectType::Bitmap).unwrap();

        let short = full.to_short();
        assert_eq!(table.lookup(short), Some(&"new"));
        assert_eq!(table.promote(short), Some(full));
        assert_eq!(table.promote(full), Some(full));
        assert!(table.promote(stale).is_none());
    }

    #[test]
    fn test_iteration_skips_free_slots() {
        let mut table = HandleTable::new(64);
        let a = table.allocate('a', ObjectType::Pen).unwrap();
        let b = table.allocate('b', ObjectType::Pen).unwrap();
        let c = table.allocate('c', ObjectType::Pen).unwrap();
        table.free(b).unwrap();

        let live: Vec<_> = table.handles().collect();
        assert_eq!(live, vec![a, c]);
        assert_eq!(table.iter().map(|(_, v)| *v).collect::<String>(), "ac");
    }
}
