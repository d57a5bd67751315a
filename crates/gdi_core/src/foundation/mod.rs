//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Integer geometry and affine transform math
//! - Color references
//! - Thread identity and the non-reentrant lock used by shared tables
//! - Logging utilities

pub mod color;
pub mod logging;
pub mod math;
pub mod sync;
pub mod thread;
