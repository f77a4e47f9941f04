//! Configuration source loading and composition

use crate::validation::Validate;
use crate::{ClientConfig, ConfigResult};
use std::path::Path;

/// Trait for loading configuration from different sources
///
/// Sources are layered: each one receives the configuration assembled so
/// far and returns it with its own values applied.
pub trait ConfigurationSource {
    /// Apply this source on top of `base`
    ///
    /// # Errors
    /// Returns configuration loading errors
    fn apply(&self, base: ClientConfig) -> ConfigResult<ClientConfig>;

    /// Get the name of this configuration source
    fn name(&self) -> &str;

    /// Get the priority of this source (higher number = higher priority)
    fn priority(&self) -> u8;
}

/// Load configuration from `PASE_*` environment variables
pub struct EnvironmentSource;

impl ConfigurationSource for EnvironmentSource {
    fn apply(&self, base: ClientConfig) -> ConfigResult<ClientConfig> {
        base.with_overrides(|key| std::env::var(key).ok())
    }

    fn name(&self) -> &'static str {
        "environment"
    }

    fn priority(&self) -> u8 {
        100 // Environment variables override everything except CLI flags
    }
}

/// Load configuration from a TOML file
///
/// Only the keys present in the file are overridden.
pub struct TomlFileSource {
    path: std::path::PathBuf,
}

impl TomlFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigurationSource for TomlFileSource {
    fn apply(&self, base: ClientConfig) -> ConfigResult<ClientConfig> {
        let content = std::fs::read_to_string(&self.path)?;
        let overlay: toml::Value = toml::from_str(&content)?;

        let mut merged = toml::Value::try_from(&base)?;
        merge_values(&mut merged, overlay);
        Ok(merged.try_into()?)
    }

    fn name(&self) -> &'static str {
        "toml_file"
    }

    fn priority(&self) -> u8 {
        50 // Medium priority - below env vars, above defaults
    }
}

/// Type alias for configuration sources
type ConfigSources = Vec<Box<dyn ConfigurationSource>>;

/// Configuration loader that combines multiple sources
pub struct ConfigurationLoader {
    sources: ConfigSources,
}

impl ConfigurationLoader {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    #[must_use]
    pub fn add_source(mut self, source: Box<dyn ConfigurationSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Load configuration from all sources with priority ordering
    ///
    /// # Errors
    /// Returns the first source loading error, or a validation error for the
    /// merged result
    pub fn load(&self) -> ConfigResult<ClientConfig> {
        let mut config = ClientConfig::default();

        // Lowest priority first, so higher priorities overwrite
        let mut sorted_sources = self.sources.iter().collect::<Vec<_>>();
        sorted_sources.sort_by_key(|source| source.priority());

        for source in sorted_sources {
            config = source.apply(config).inspect_err(|e| {
                tracing::warn!("Failed to load from source {}: {e}", source.name());
            })?;
            tracing::debug!("Loaded configuration from source: {}", source.name());
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively merge `overlay` into `base`; tables merge key by key, any
/// other value replaces the base value
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
