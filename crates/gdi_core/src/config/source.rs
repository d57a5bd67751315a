//! Read-only key/value settings store
//!
//! Stands in for the registry-like store the display settings live in. The
//! service consults it for exactly one value, the logical DPI, and caches the
//! answer for the lifetime of the process.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::ConfigError;

/// Key holding the logical pixels-per-inch value
pub const LOG_PIXELS_KEY: &str = "Desktop.LogPixels";

/// DPI used when the store has no usable value
pub const DEFAULT_DPI: u32 = 96;

/// A read-only settings lookup
pub trait ConfigSource: Send + Sync {
    /// Raw value stored under `key`
    fn value(&self, key: &str) -> Option<String>;
}

/// In-memory store, mostly for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    values: HashMap<String, String>,
}

impl MemorySource {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a value
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ConfigSource for MemorySource {
    fn value(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Store backed by a TOML document; keys are dotted paths into its tables
#[derive(Debug, Clone, Default)]
pub struct TomlSource {
    table: toml::Table,
}

impl TomlSource {
    /// Parse a TOML document
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let table = text
            .parse::<toml::Table>()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(Self { table })
    }

    /// Read and parse a TOML file
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }
}

impl ConfigSource for TomlSource {
    fn value(&self, key: &str) -> Option<String> {
        let mut parts = key.split('.');
        let mut current = self.table.get(parts.next()?)?;
        for part in parts {
            current = current.as_table()?.get(part)?;
        }
        match current {
            toml::Value::String(s) => Some(s.clone()),
            toml::Value::Integer(i) => Some(i.to_string()),
            toml::Value::Float(f) => Some(f.to_string()),
            toml::Value::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// DPI lookup performed at most once
pub struct DpiSettings {
    source: Box<dyn ConfigSource>,
    dpi: OnceLock<u32>,
}

impl std::fmt::Debug for DpiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DpiSettings").field("dpi", &self.dpi.get()).finish()
    }
}

impl DpiSettings {
    /// Wrap a settings source
    pub fn new(source: Box<dyn ConfigSource>) -> Self {
        Self {
            source,
            dpi: OnceLock::new(),
        }
    }

    /// Logical DPI, read from the source on first call
    pub fn dpi(&self) -> u32 {
        *self.dpi.get_or_init(|| {
            match self.source.value(LOG_PIXELS_KEY).map(|v| v.trim().parse::<u32>()) {
                Some(Ok(dpi)) if dpi > 0 => {
                    log::debug!("Logical DPI {} read from settings", dpi);
                    dpi
                }
                Some(_) => {
                    log::warn!("Ignoring malformed {} value, using {}", LOG_PIXELS_KEY, DEFAULT_DPI);
                    DEFAULT_DPI
                }
                None => DEFAULT_DPI,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSource {
        reads: Arc<AtomicUsize>,
        value: Option<&'static str>,
    }

    impl ConfigSource for CountingSource {
        fn value(&self, _key: &str) -> Option<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.value.map(str::to_string)
        }
    }

    #[test]
    fn test_dpi_is_read_once() {
        let reads = Arc::new(AtomicUsize::new(0));
        let settings = DpiSettings::new(Box::new(CountingSource {
            reads: reads.clone(),
            value: Some("120"),
        }));

        assert_eq!(settings.dpi(), 120);
        assert_eq!(settings.dpi(), 120);
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dpi_defaults() {
        let missing = DpiSettings::new(Box::new(MemorySource::new()));
        assert_eq!(missing.dpi(), DEFAULT_DPI);

        let garbage = DpiSettings::new(Box::new(MemorySource::new().with_value(LOG_PIXELS_KEY, "lots")));
        assert_eq!(garbage.dpi(), DEFAULT_DPI);

        let zero = DpiSettings::new(Box::new(MemorySource::new().with_value(LOG_PIXELS_KEY, "0")));
        assert_eq!(zero.dpi(), DEFAULT_DPI);
    }

    #[test]
    fn test_toml_source_dotted_keys() {
        let source = TomlSource::parse(
            r#"
            [Desktop]
            LogPixels = 144
            Name = "primary"
            "#,
        )
        .unwrap();

        assert_eq!(source.value(LOG_PIXELS_KEY).as_deref(), Some("144"));
        assert_eq!(source.value("Desktop.Name").as_deref(), Some("primary"));
        assert_eq!(source.value("Desktop.Missing"), None);
        assert_eq!(DpiSettings::new(Box::new(source)).dpi(), 144);
    }
}
