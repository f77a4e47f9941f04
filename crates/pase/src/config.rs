//! Configuration assembly for the pase CLI

use anyhow::{Context, Result};
use pase_config::{
    ClientConfig, ConfigurationLoader, EnvironmentSource, ResponseShape, TomlFileSource, Validate,
};
use std::path::Path;

/// Settings given on the command line; they override every other source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub api_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub shape: Option<ResponseShape>,
    pub concurrent_followups: Option<bool>,
    pub cancel_superseded: Option<bool>,
}

impl CliOverrides {
    pub fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(url) = &self.api_url {
            config.api.url.clone_from(url);
        }
        if let Some(timeout) = self.timeout_seconds {
            config.api.timeout_seconds = timeout;
        }
        if let Some(shape) = self.shape {
            config.search.shape = shape;
        }
        if let Some(concurrent) = self.concurrent_followups {
            config.search.concurrent_followups = concurrent;
        }
        if let Some(cancel) = self.cancel_superseded {
            config.search.cancel_superseded = cancel;
        }
        config
    }
}

/// Defaults, then the TOML file, then `PASE_*` variables, then CLI flags
///
/// # Errors
/// Returns an error if the config file cannot be read or parsed, or the
/// merged configuration is invalid
pub fn load(config_file: Option<&Path>, overrides: &CliOverrides) -> Result<ClientConfig> {
    let mut loader = ConfigurationLoader::new().add_source(Box::new(EnvironmentSource));
    if let Some(path) = config_file {
        loader = loader.add_source(Box::new(TomlFileSource::new(path)));
    }

    let config = loader.load().with_context(|| match config_file {
        Some(path) => format!("Failed to load configuration from '{}'", path.display()),
        None => "Failed to load configuration".to_string(),
    })?;

    let config = overrides.apply(config);
    config
        .validate()
        .context("Invalid command-line configuration")?;
    Ok(config)
}
