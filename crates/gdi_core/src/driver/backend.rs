//! Display backends and the registry they are resolved from

use std::sync::{Arc, Mutex, PoisonError};

use super::caps::{DeviceCap, DeviceCaps};
use super::gamma::GammaRamp;
use super::layer::{DeviceLayer, Next};
use super::{TextMetrics, CATALOG_VERSION};
use crate::config::DisplayConfig;
use crate::foundation::math::Size;
use crate::handle::Handle;
use crate::object::LogFont;

/// Inputs available to a backend factory
#[derive(Debug, Clone)]
pub struct BackendContext {
    /// Display section of the service configuration
    pub display: DisplayConfig,
    /// Logical DPI
    pub dpi: u32,
}

impl BackendContext {
    /// Capabilities described by the configuration
    pub fn caps(&self) -> DeviceCaps {
        DeviceCaps {
            width: self.display.width,
            height: self.display.height,
            bits_per_pixel: self.display.bits_per_pixel,
            width_mm: self.display.width_mm,
            height_mm: self.display.height_mm,
            ..DeviceCaps::with_dpi(self.dpi)
        }
    }
}

/// A process-wide display driver
///
/// Installed once by the [`DriverLoader`](super::DriverLoader) and shared
/// read-only afterwards.
pub trait DisplayBackend: Send + Sync {
    /// Registry name
    fn name(&self) -> &str;

    /// Catalog revision the backend was written against
    fn catalog_version(&self) -> u32 {
        CATALOG_VERSION
    }

    /// Layer to place in a display context's chain, `None` to leave every
    /// operation to the layers below
    fn create_layer(&self) -> Option<Box<dyn DeviceLayer>> {
        None
    }
}

/// Backend with no layer of its own
#[derive(Debug, Default)]
pub struct NullBackend;

impl DisplayBackend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }
}

#[derive(Debug)]
struct HeadlessState {
    caps: DeviceCaps,
    gamma: Mutex<GammaRamp>,
}

/// Built-in backend describing an off-screen display of configured size
#[derive(Debug)]
pub struct HeadlessBackend {
    state: Arc<HeadlessState>,
}

impl HeadlessBackend {
    /// Backend with the geometry in `context`
    pub fn new(context: &BackendContext) -> Self {
        Self {
            state: Arc::new(HeadlessState {
                caps: context.caps(),
                gamma: Mutex::new(GammaRamp::linear()),
            }),
        }
    }
}

impl DisplayBackend for HeadlessBackend {
    fn name(&self) -> &str {
        "headless"
    }

    fn create_layer(&self) -> Option<Box<dyn DeviceLayer>> {
        Some(Box::new(HeadlessLayer {
            state: self.state.clone(),
            font: None,
        }))
    }
}

struct HeadlessLayer {
    state: Arc<HeadlessState>,
    font: Option<LogFont>,
}

impl HeadlessLayer {
    fn metrics(&self) -> Option<TextMetrics> {
        let font = self.font.as_ref()?;
        let height = if font.height == 0 { 16 } else { font.height.abs() };
        let ave = if font.width > 0 { font.width } else { (height / 2).max(1) };
        let ascent = height * 4 / 5;
        Some(TextMetrics {
            height,
            ascent,
            descent: height - ascent,
            ave_char_width: ave,
            max_char_width: if font.fixed_pitch { ave } else { ave * 2 },
            weight: font.weight,
        })
    }
}

impl DeviceLayer for HeadlessLayer {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn select_font(&mut self, next: Next<'_>, handle: Handle, font: &LogFont) -> bool {
        self.font = Some(font.clone());
        next.select_font(handle, font)
    }

    fn get_text_metrics(&mut self, _next: Next<'_>) -> Option<TextMetrics> {
        self.metrics()
    }

    fn get_text_extent(&mut self, _next: Next<'_>, text: &str) -> Option<Size> {
        let metrics = self.metrics()?;
        let count = i32::try_from(text.chars().count()).unwrap_or(i32::MAX);
        Some(Size::new(count.saturating_mul(metrics.ave_char_width), metrics.height))
    }

    fn get_device_caps(&mut self, _next: Next<'_>, cap: DeviceCap) -> i32 {
        self.state.caps.query(cap)
    }

    fn get_device_gamma_ramp(&mut self, _next: Next<'_>) -> Option<GammaRamp> {
        Some(self.state.gamma.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn set_device_gamma_ramp(&mut self, _next: Next<'_>, ramp: &GammaRamp) -> bool {
        *self.state.gamma.lock().unwrap_or_else(PoisonError::into_inner) = ramp.clone();
        true
    }
}

/// Constructor registered under a backend name
pub type BackendFactory = Box<dyn Fn(&BackendContext) -> Arc<dyn DisplayBackend> + Send + Sync>;

/// Named backend factories
pub struct BackendRegistry {
    factories: Vec<(String, BackendFactory)>,
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry").field("names", &self.names()).finish()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl BackendRegistry {
    /// Registry with no factories
    pub fn empty() -> Self {
        Self { factories: Vec::new() }
    }

    /// Registry holding the built-in `headless` and `null` backends
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("headless", |context| Arc::new(HeadlessBackend::new(context)));
        registry.register("null", |_| Arc::new(NullBackend));
        registry
    }

    /// Add or replace a factory
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&BackendContext) -> Arc<dyn DisplayBackend> + Send + Sync + 'static,
    {
        let name = name.into();
        self.factories.retain(|(existing, _)| *existing != name);
        self.factories.push((name, Box::new(factory)));
    }

    /// Registered names
    pub fn names(&self) -> Vec<&str> {
        self.factories.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Build the backend registered as `name`
    ///
    /// Unknown names and backends built against another catalog revision
    /// resolve to [`NullBackend`].
    pub fn resolve(&self, name: &str, context: &BackendContext) -> Arc<dyn DisplayBackend> {
        let Some((_, factory)) = self.factories.iter().find(|(n, _)| n == name) else {
            log::warn!("No display backend named {:?}, using null backend", name);
            return Arc::new(NullBackend);
        };

        let backend = factory(context);
        if backend.catalog_version() != CATALOG_VERSION {
            log::warn!(
                "Display backend {:?} built for catalog {}, expected {}; using null backend",
                name,
                backend.catalog_version(),
                CATALOG_VERSION
            );
            return Arc::new(NullBackend);
        }
        backend
    }
}
