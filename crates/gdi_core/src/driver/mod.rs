//! Physical device dispatch
//!
//! Every device context owns a [`DeviceChain`]: an ordered list of
//! [`DeviceLayer`]s, outermost first, that always ends with a [`NullLayer`].
//! An operation enters at the outermost layer; a layer either handles it or
//! passes it inward through the [`Next`] cursor it was given. Because the
//! trait's default methods forward and the null layer answers everything, any
//! chain resolves any operation.
//!
//! Real display support comes from a [`DisplayBackend`] chosen by name from a
//! [`BackendRegistry`]. The [`DriverLoader`] resolves it on first use and
//! installs it for the whole process.

mod backend;
mod caps;
mod chain;
mod gamma;
mod layer;
mod loader;
mod memory;
mod null;

pub use backend::{
    BackendContext, BackendFactory, BackendRegistry, DisplayBackend, HeadlessBackend, NullBackend,
};
pub use caps::{DeviceCap, DeviceCaps};
pub use chain::DeviceChain;
pub use gamma::{check_gamma_ramp, GammaRamp, GAMMA_RAMP_SIZE};
pub use layer::{DeviceLayer, Next};
pub use loader::{DriverLoader, LazyDisplayLayer};
pub use memory::MemoryLayer;
pub use null::NullLayer;

/// Revision of the [`DeviceLayer`] operation catalog
///
/// Backends built against another revision are refused by the registry.
pub const CATALOG_VERSION: u32 = 3;

/// Font metrics reported by a device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextMetrics {
    /// Character cell height
    pub height: i32,
    /// Units above the baseline
    pub ascent: i32,
    /// Units below the baseline
    pub descent: i32,
    /// Average character width
    pub ave_char_width: i32,
    /// Widest character
    pub max_char_width: i32,
    /// Font weight
    pub weight: i32,
}

/// Raster operation codes accepted by `pat_blt`
pub mod rop {
    /// Fill with the current brush
    pub const PATCOPY: u32 = 0x00F0_0021;
    /// Invert the destination with the brush
    pub const PATINVERT: u32 = 0x005A_0049;
    /// Invert the destination
    pub const DSTINVERT: u32 = 0x0055_0009;
    /// Fill with black
    pub const BLACKNESS: u32 = 0x0000_0042;
    /// Fill with white
    pub const WHITENESS: u32 = 0x00FF_0062;
}
