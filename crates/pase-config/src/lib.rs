//! Centralized configuration management for the PaSe client
//!
//! Configuration follows a simple hierarchy:
//! 1. Safe defaults (defined as constants)
//! 2. TOML file overrides
//! 3. Environment variable overrides (unparseable values are errors)
//! 4. Runtime validation
//!
//! Command-line flags are applied on top by the binary.

pub mod error;
pub mod source;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use source::{ConfigurationLoader, ConfigurationSource, EnvironmentSource, TomlFileSource};
pub use validation::Validate;

use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// SAFE DEFAULTS
// =============================================================================

// Backend API
const DEFAULT_API_URL: &str = "http://localhost:4567";
const DEFAULT_API_TIMEOUT_SECONDS: u64 = 30;

// Search dispatch
const DEFAULT_CONCURRENT_FOLLOWUPS: bool = true;
const DEFAULT_CANCEL_SUPERSEDED: bool = false;

// Telemetry
const DEFAULT_TRACING_LEVEL: &str = "info";
const TRACING_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Backend protocol revision the client speaks
///
/// The backend evolved from one endpoint returning a single pre-merged
/// payload to three mode-specific endpoints returning per-file, per-chunk
/// results. The shape is picked once at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseShape {
    /// `POST /search`, `POST /search?applied_patch=true`, `POST /search?by_content=true`
    #[default]
    MultiQuery,

    /// Legacy `GET /search?patch=<url-encoded patch>` returning one payload
    SingleQuery,
}

impl std::fmt::Display for ResponseShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultiQuery => write!(f, "multi-query"),
            Self::SingleQuery => write!(f, "single-query"),
        }
    }
}

impl std::str::FromStr for ResponseShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "multi-query" | "multi" => Ok(Self::MultiQuery),
            "single-query" | "single" | "legacy" => Ok(Self::SingleQuery),
            _ => Err(format!(
                "Invalid response shape: '{s}'. Valid options are: multi-query, single-query"
            )),
        }
    }
}

/// Core configuration for the PaSe client
///
/// Every field has a safe default so a partial TOML file (or none at all)
/// still produces a usable configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend search API connection
    pub api: ApiConfig,

    /// Query dispatch policy
    pub search: SearchConfig,

    /// Logging configuration
    pub telemetry: TelemetryConfig,
}

/// Backend search API connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the search service (the `/search` path is appended)
    pub url: String,

    /// Per-request timeout in seconds; expiry is reported as a transport failure
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            timeout_seconds: DEFAULT_API_TIMEOUT_SECONDS,
        }
    }
}

impl ApiConfig {
    /// Request timeout as a `Duration`
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Query dispatch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Backend protocol revision
    pub shape: ResponseShape,

    /// Dispatch the non-primary queries concurrently once the primary succeeded
    pub concurrent_followups: bool,

    /// Abort in-flight queries of a submission once a newer one starts
    pub cancel_superseded: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            shape: ResponseShape::default(),
            concurrent_followups: DEFAULT_CONCURRENT_FOLLOWUPS,
            cancel_superseded: DEFAULT_CANCEL_SUPERSEDED,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Fallback filter when `RUST_LOG` is not set
    pub tracing_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            tracing_level: DEFAULT_TRACING_LEVEL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Overlay values produced by `lookup` (keyed by environment variable name)
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` naming the variable when a value
    /// cannot be parsed
    pub fn with_overrides<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PASE_API_URL") {
            self.api.url = url;
        }
        override_parsed(
            &lookup,
            "PASE_API_TIMEOUT_SECONDS",
            "a whole number of seconds",
            &mut self.api.timeout_seconds,
        )?;
        override_parsed(
            &lookup,
            "PASE_SEARCH_SHAPE",
            "multi-query, single-query",
            &mut self.search.shape,
        )?;
        override_parsed(
            &lookup,
            "PASE_SEARCH_CONCURRENT_FOLLOWUPS",
            "true, false",
            &mut self.search.concurrent_followups,
        )?;
        override_parsed(
            &lookup,
            "PASE_SEARCH_CANCEL_SUPERSEDED",
            "true, false",
            &mut self.search.cancel_superseded,
        )?;
        if let Some(level) = lookup("PASE_TRACING_LEVEL") {
            self.telemetry.tracing_level = level;
        }
        Ok(self)
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, expected: &str, target: &mut T) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let Some(raw) = lookup(key) else {
        return Ok(());
    };
    match raw.trim().parse() {
        Ok(value) => {
            *target = value;
            Ok(())
        }
        Err(_) => Err(ConfigError::InvalidValue {
            field: key.to_string(),
            value: raw,
            expected: expected.to_string(),
        }),
    }
}

impl Validate for ApiConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_url(&self.url, "api.url")?;
        validation::validate_range(self.timeout_seconds, 1, 3600, "api.timeout_seconds")?;
        Ok(())
    }
}

impl Validate for TelemetryConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_non_empty(&self.tracing_level, "telemetry.tracing_level")?;
        validation::validate_one_of(
            &self.tracing_level,
            TRACING_LEVELS,
            "telemetry.tracing_level",
        )
    }
}

impl Validate for ClientConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.api.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }
}
