//! # GDI Core
//!
//! The object and device-context layer of a GDI-style 2D graphics subsystem.
//!
//! ## Features
//!
//! - **Handle Table**: generation-checked 32-bit handles for every resource
//! - **Deferred Deletion**: objects selected into a context outlive their delete call
//! - **Attribute Arena**: context attributes published as flat, fixed-layout blocks
//! - **Device Contexts**: save/restore, mapping modes, world transforms, clipping and paths
//! - **Layered Drivers**: per-context dispatch chains ending in a null layer
//! - **Lazy Driver Loading**: the display backend is resolved on first use
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gdi_core::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gdi = Gdi::new(GdiConfig::default())?;
//!     let hdc = gdi.create_compatible_dc(None)?;
//!     let bitmap = gdi.create_bitmap(64, 64, 32)?;
//!     gdi.select_object(hdc, bitmap)?;
//!
//!     gdi.move_to(hdc, Point::new(0, 0))?;
//!     gdi.line_to(hdc, Point::new(63, 63))?;
//!
//!     gdi.delete_dc(hdc)?;
//!     gdi.delete_object(bitmap)?;
//!     gdi.shutdown();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod handle;
pub mod object;
pub mod arena;
pub mod dc;
pub mod driver;

mod error;
mod gdi;

pub use error::{DeleteOutcome, GdiError, GdiResult};
pub use gdi::{Gdi, GdiStats};

#[cfg(test)]
mod tests;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        config::{ConfigSource, GdiConfig, MemorySource, TomlSource},
        dc::modes::{
            ArcDirection, BackgroundMode, BoundsFlags, GraphicsMode, Layout, MapMode, Rop2, TextAlign,
            TransformKind, WorldModify,
        },
        driver::{rop, DeviceCap, DeviceLayer, GammaRamp, Next},
        foundation::{
            color::ColorRef,
            math::{Point, Rect, Size, Xform},
        },
        handle::{Handle, ObjectType},
        object::{HatchStyle, LogFont, PaletteEntry, PenStyle, StockObject},
        DeleteOutcome, Gdi, GdiError, GdiResult, GdiStats,
    };
}
