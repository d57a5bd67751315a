//! Attribute arena
//!
//! Fixed-size [`DcAttr`] blocks carved from fixed-size backing regions. A
//! region holds as many blocks as fit in one allocation granularity and is
//! never moved or shrunk once reserved, so a block stays at the same place for
//! as long as it is allocated. Each region keeps its own free list; fresh
//! blocks come from a bump index past the last block ever used.
//!
//! Blocks are named by [`AttrBlock`], a global block number. Region `n` owns
//! the numbers `n * blocks_per_region .. (n + 1) * blocks_per_region`, which is
//! also the block's position in the region byte images handed to external
//! readers.

mod attr;

pub use attr::{DcAttr, DC_ATTR_VERSION};

use crate::config::ArenaConfig;
use crate::error::{GdiError, GdiResult};

/// Global number of an allocated attribute block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttrBlock(u32);

impl AttrBlock {
    /// Block number
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Arena occupancy figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArenaUsage {
    /// Backing regions reserved
    pub regions: usize,
    /// Blocks currently allocated
    pub live_blocks: usize,
    /// Blocks the reserved regions can hold
    pub capacity_blocks: usize,
}

struct Region {
    base: u32,
    blocks: Box<[DcAttr]>,
    in_use: Vec<bool>,
    free: Vec<u32>,
    next_unused: u32,
}

impl Region {
    fn new(base: u32, count: u32) -> Self {
        Self {
            base,
            blocks: vec![DcAttr::default(); count as usize].into_boxed_slice(),
            in_use: vec![false; count as usize],
            free: Vec::new(),
            next_unused: 0,
        }
    }

    fn contains(&self, block: AttrBlock) -> bool {
        block.0 >= self.base && block.0 - self.base < self.blocks.len() as u32
    }

    fn take(&mut self) -> Option<u32> {
        if let Some(slot) = self.free.pop() {
            return Some(slot);
        }
        if (self.next_unused as usize) < self.blocks.len() {
            self.next_unused += 1;
            return Some(self.next_unused - 1);
        }
        None
    }
}

/// Bump and free-list allocator for [`DcAttr`] blocks
pub struct AttributeArena {
    regions: Vec<Region>,
    blocks_per_region: u32,
    max_regions: usize,
    live: usize,
}

impl std::fmt::Debug for AttributeArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeArena")
            .field("usage", &self.usage())
            .field("blocks_per_region", &self.blocks_per_region)
            .finish()
    }
}

impl AttributeArena {
    /// Create an empty arena; no region is reserved until the first allocation
    pub fn new(config: &ArenaConfig) -> Self {
        let per_region = (config.granularity / std::mem::size_of::<DcAttr>()).max(1);
        Self {
            regions: Vec::new(),
            blocks_per_region: u32::try_from(per_region).unwrap_or(u32::MAX),
            max_regions: config.max_regions,
            live: 0,
        }
    }

    /// Blocks held by each backing region
    pub fn blocks_per_region(&self) -> u32 {
        self.blocks_per_region
    }

    /// Allocate a zeroed block
    pub fn alloc(&mut self) -> GdiResult<AttrBlock> {
        let found = self
            .regions
            .iter_mut()
            .enumerate()
            .find_map(|(index, region)| region.take().map(|slot| (index, slot)));

        let (index, slot) = match found {
            Some(found) => found,
            None => self.reserve_region()?,
        };

        let region = &mut self.regions[index];
        region.blocks[slot as usize] = DcAttr::default();
        region.in_use[slot as usize] = true;
        self.live += 1;
        Ok(AttrBlock(region.base + slot))
    }

    fn reserve_region(&mut self) -> GdiResult<(usize, u32)> {
        let exhausted = GdiError::ArenaExhausted {
            regions: self.regions.len(),
        };
        if self.regions.len() >= self.max_regions {
            log::warn!("Attribute arena exhausted at {} regions", self.regions.len());
            return Err(exhausted);
        }
        let base = u32::try_from(self.regions.len())
            .ok()
            .and_then(|n| n.checked_mul(self.blocks_per_region))
            .ok_or(exhausted)?;

        log::debug!(
            "Reserving attribute region {} ({} blocks)",
            self.regions.len(),
            self.blocks_per_region
        );
        let mut region = Region::new(base, self.blocks_per_region);
        let slot = region.take().unwrap_or_default();
        self.regions.push(region);
        Ok((self.regions.len() - 1, slot))
    }

    fn locate(&self, block: AttrBlock) -> Option<(usize, usize)> {
        let region = self.regions.iter().position(|r| r.contains(block))?;
        let slot = (block.0 - self.regions[region].base) as usize;
        self.regions[region].in_use[slot].then_some((region, slot))
    }

    /// Return a block to its region's free list
    pub fn free(&mut self, block: AttrBlock) -> GdiResult<()> {
        let (region, slot) = self.locate(block).ok_or(GdiError::InvalidBlock(block.0))?;
        let region = &mut self.regions[region];
        region.in_use[slot] = false;
        // slot < blocks_per_region, which fits u32
        region.free.push(slot as u32);
        self.live -= 1;
        Ok(())
    }

    /// Copy of a live block
    pub fn read(&self, block: AttrBlock) -> GdiResult<DcAttr> {
        let (region, slot) = self.locate(block).ok_or(GdiError::InvalidBlock(block.0))?;
        Ok(self.regions[region].blocks[slot])
    }

    /// Mutate a live block in place
    pub fn update<R>(&mut self, block: AttrBlock, f: impl FnOnce(&mut DcAttr) -> R) -> GdiResult<R> {
        let (region, slot) = self.locate(block).ok_or(GdiError::InvalidBlock(block.0))?;
        Ok(f(&mut self.regions[region].blocks[slot]))
    }

    /// Overwrite a live block
    pub fn write(&mut self, block: AttrBlock, value: DcAttr) -> GdiResult<()> {
        self.update(block, |attr| *attr = value)
    }

    /// Byte image of a whole region as an external reader maps it
    pub fn region_bytes(&self, region: usize) -> Option<&[u8]> {
        self.regions
            .get(region)
            .map(|r| bytemuck::cast_slice::<DcAttr, u8>(&r.blocks))
    }

    /// Region number and byte offset of a block within that region's image
    pub fn block_offset(&self, block: AttrBlock) -> Option<(usize, usize)> {
        let (region, slot) = self.locate(block)?;
        Some((region, slot * std::mem::size_of::<DcAttr>()))
    }

    /// Current occupancy
    pub fn usage(&self) -> ArenaUsage {
        ArenaUsage {
            regions: self.regions.len(),
            live_blocks: self.live,
            capacity_blocks: self.regions.len() * self.blocks_per_region as usize,
        }
    }
}
