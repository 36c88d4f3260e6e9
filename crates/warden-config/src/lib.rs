//! # Warden Config - Configuration Management
//!
//! Loads engine settings from an optional file plus `WARDEN_`-prefixed
//! environment variables.

use std::path::Path;

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WardenConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fail materialization on undefined template variables instead of
    /// substituting null with a warning.
    #[serde(default)]
    pub strict_templates: bool,

    /// Run the operator validator inside query preparation.
    #[serde(default = "default_validate_operators")]
    pub validate_operators: bool,
}

fn default_validate_operators() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_templates: false,
            validate_operators: default_validate_operators(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    #[serde(default = "default_cache_max_capacity")]
    pub max_capacity: u64,

    #[serde(default = "default_cache_ttl_seconds")]
    pub ttl_seconds: u64,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_max_capacity() -> u64 {
    10_000
}

fn default_cache_ttl_seconds() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            max_capacity: default_cache_max_capacity(),
            ttl_seconds: default_cache_ttl_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_tracing_enabled")]
    pub tracing_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tracing_enabled() -> bool {
    true
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            tracing_enabled: default_tracing_enabled(),
        }
    }
}

impl WardenConfig {
    /// Load configuration, layering environment variables over an
    /// optional file over defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder
            .add_source(Environment::with_prefix("WARDEN").separator("__"))
            .build()?
            .try_deserialize()
    }
}
