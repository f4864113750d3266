//! Config loader (C7, §4.7, ambient): a minimal property-bag abstraction plus
//! a file/env-backed implementation built the way the teacher layers
//! `config`/`toml` for settings loading. The exchange core interprets exactly
//! one key, `exchange.type` (§6); everything else a caller stores in the bag
//! is opaque to this crate.

use std::collections::HashMap;
use std::path::Path;

/// The property bag consumed from the framework: a flat string→string
/// lookup. Implementors decide what source backs `get` (a map, a file, the
/// environment, ...).
pub trait PropertyBag: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// In-memory property bag; what unit tests construct directly.
#[derive(Debug, Clone, Default)]
pub struct MapPropertyBag(HashMap<String, String>);

impl MapPropertyBag {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

impl PropertyBag for MapPropertyBag {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

/// Production property bag: an optional TOML file layered under environment
/// overrides (`XCHANGE_` prefix, `_` separating nested keys, e.g.
/// `XCHANGE_EXCHANGE_TYPE` overrides `exchange.type`).
pub struct FileConfig {
    inner: config::Config,
}

impl FileConfig {
    /// Loads configuration from an optional TOML file plus the environment.
    /// A missing file is not an error — the environment (and any defaults
    /// the caller adds before calling `build`) still apply.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let inner = builder
            .add_source(config::Environment::with_prefix("XCHANGE").separator("_"))
            .build()
            .map_err(|e| ConfigError::Source(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl PropertyBag for FileConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get_string(key).ok()
    }
}

/// Configuration failures (C9's `Error::Config` wraps these).
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid value {value:?} for key {key}")]
    InvalidValue { key: String, value: String },

    #[error("config source error: {0}")]
    Source(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_bag_round_trips() {
        let bag = MapPropertyBag::new().with("exchange.type", "sync");
        assert_eq!(bag.get("exchange.type").as_deref(), Some("sync"));
        assert_eq!(bag.get("missing"), None);
    }

    // Both cases share one test: mutating the process environment races
    // against other tests in this module if split across `#[test]` fns that
    // `cargo test` may run concurrently.
    #[test]
    fn file_config_reads_environment_and_treats_unset_as_none() {
        let unset = FileConfig::load(None).unwrap();
        assert_eq!(unset.get("exchange.type"), None);

        std::env::set_var("XCHANGE_EXCHANGE_TYPE", "async");
        let set = FileConfig::load(None).unwrap();
        assert_eq!(set.get("exchange.type").as_deref(), Some("async"));
        std::env::remove_var("XCHANGE_EXCHANGE_TYPE");
    }
}
