//! Error types for the graphics core

use thiserror::Error;

use crate::config::ConfigError;
use crate::handle::{Handle, ObjectType};

/// Errors returned by service operations
#[derive(Debug, Error)]
pub enum GdiError {
    /// Handle is null, stale, freed or out of range
    #[error("invalid handle {0}")]
    InvalidHandle(Handle),

    /// Handle resolves to an object of another kind
    #[error("handle {handle} is a {found:?}, expected {expected}")]
    WrongType {
        /// The handle
        handle: Handle,
        /// Kind the operation needs
        expected: &'static str,
        /// Kind actually stored
        found: ObjectType,
    },

    /// Device context is held by another thread
    #[error("device context {handle} is in use by thread {owner}")]
    ThreadOwnershipViolation {
        /// The context
        handle: Handle,
        /// Id of the thread holding it
        owner: u64,
    },

    /// Every handle table slot is in use
    #[error("handle table exhausted ({capacity} slots)")]
    OutOfHandles {
        /// Table capacity
        capacity: usize,
    },

    /// The attribute arena cannot grow further
    #[error("attribute arena exhausted ({regions} regions)")]
    ArenaExhausted {
        /// Regions already allocated
        regions: usize,
    },

    /// Attribute block id does not name a live block
    #[error("invalid attribute block {0}")]
    InvalidBlock(u32),

    /// The current transform cannot be inverted
    #[error("transform is singular")]
    SingularTransform,

    /// Save level out of range
    #[error("cannot restore to level {requested} (current depth {current})")]
    InvalidSaveLevel {
        /// Level asked for
        requested: i32,
        /// Current save depth
        current: i32,
    },

    /// Context still has outstanding references
    #[error("device context {0} still in use")]
    DcInUse(Handle),

    /// Argument rejected
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Operation not supported by the device
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    /// Configuration failure
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result alias for service operations
pub type GdiResult<T> = Result<T, GdiError>;

/// Outcome of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Object destroyed and handle freed
    Deleted,
    /// Object still selected somewhere; destroyed once the last selection is released
    Deferred,
    /// Stock object, never destroyed
    Protected,
}

impl GdiError {
    /// Shorthand for [`GdiError::InvalidParameter`]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParameter(reason.into())
    }
}
