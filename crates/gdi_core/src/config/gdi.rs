//! Service configuration
//!
//! Sizing for the shared tables, the display driver to load, and the numeric
//! thresholds used by transform math. Every section has defaults so a bare
//! `GdiConfig::default()` yields a working headless service.

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::foundation::math::DEFAULT_SINGULAR_EPSILON;
use crate::handle::{FIRST_HANDLE_INDEX, MAX_HANDLE_CAPACITY};

/// Handle table sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandleConfig {
    /// Number of table slots, including the reserved low indices
    pub capacity: usize,
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self { capacity: 16384 }
    }
}

/// Attribute arena sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Size in bytes of each backing region
    pub granularity: usize,
    /// Upper bound on the number of backing regions
    pub max_regions: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            granularity: 64 * 1024,
            max_regions: 64,
        }
    }
}

/// Display driver selection and the geometry reported by the headless backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Name of the backend to resolve on first display use
    pub driver: String,
    /// Horizontal resolution in pixels
    pub width: i32,
    /// Vertical resolution in pixels
    pub height: i32,
    /// Color depth
    pub bits_per_pixel: i32,
    /// Physical width in millimetres; derived from DPI when absent
    pub width_mm: Option<i32>,
    /// Physical height in millimetres; derived from DPI when absent
    pub height_mm: Option<i32>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            driver: "headless".to_string(),
            width: 1024,
            height: 768,
            bits_per_pixel: 32,
            width_mm: None,
            height_mm: None,
        }
    }
}

/// Numeric thresholds for the mapping pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Determinants with smaller magnitude are treated as singular
    pub singular_epsilon: f64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            singular_epsilon: DEFAULT_SINGULAR_EPSILON,
        }
    }
}

/// # Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GdiConfig {
    /// Handle table settings
    pub handles: HandleConfig,
    /// Attribute arena settings
    pub arena: ArenaConfig,
    /// Display driver settings
    pub display: DisplayConfig,
    /// Transform thresholds
    pub transform: TransformConfig,
}

impl GdiConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the handle table capacity
    pub fn with_handle_capacity(mut self, capacity: usize) -> Self {
        self.handles.capacity = capacity;
        self
    }

    /// Set the arena region size and count limit
    pub fn with_arena(mut self, granularity: usize, max_regions: usize) -> Self {
        self.arena.granularity = granularity;
        self.arena.max_regions = max_regions;
        self
    }

    /// Select the display driver by name
    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.display.driver = driver.into();
        self
    }

    /// Set the headless display resolution
    pub fn with_resolution(mut self, width: i32, height: i32) -> Self {
        self.display.width = width;
        self.display.height = height;
        self
    }

    /// Set the singular determinant threshold
    pub fn with_singular_epsilon(mut self, epsilon: f64) -> Self {
        self.transform.singular_epsilon = epsilon;
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capacity = self.handles.capacity;
        if capacity <= FIRST_HANDLE_INDEX as usize || capacity > MAX_HANDLE_CAPACITY {
            return Err(ConfigError::Invalid {
                key: "handles.capacity",
                reason: format!(
                    "{} is outside {}..={}",
                    capacity,
                    FIRST_HANDLE_INDEX + 1,
                    MAX_HANDLE_CAPACITY
                ),
            });
        }

        let block = std::mem::size_of::<crate::arena::DcAttr>();
        if self.arena.granularity < block {
            return Err(ConfigError::Invalid {
                key: "arena.granularity",
                reason: format!("must hold at least one {block}-byte block"),
            });
        }
        if self.arena.max_regions == 0 {
            return Err(ConfigError::Invalid {
                key: "arena.max_regions",
                reason: "at least one region is required".to_string(),
            });
        }

        if self.display.width <= 0 || self.display.height <= 0 {
            return Err(ConfigError::Invalid {
                key: "display",
                reason: "resolution must be positive".to_string(),
            });
        }
        if !matches!(self.display.bits_per_pixel, 1 | 4 | 8 | 16 | 24 | 32) {
            return Err(ConfigError::Invalid {
                key: "display.bits_per_pixel",
                reason: format!("unsupported depth {}", self.display.bits_per_pixel),
            });
        }

        let epsilon = self.transform.singular_epsilon;
        if !(epsilon.is_finite() && epsilon >= 0.0) {
            return Err(ConfigError::Invalid {
                key: "transform.singular_epsilon",
                reason: "must be finite and non-negative".to_string(),
            });
        }

        Ok(())
    }
}

impl Config for GdiConfig {}
