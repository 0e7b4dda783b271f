//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use metron_backends::BackendConfig;
use serde::Deserialize;
use std::path::Path;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// CLI configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Namespace for emitted metrics
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Backends to install
    #[serde(default = "default_backends")]
    pub backends: Vec<BackendConfig>,
}

fn default_namespace() -> String {
    "metron".to_string()
}

fn default_backends() -> Vec<BackendConfig> {
    vec![BackendConfig::new("logging")]
}

/// Load configuration from files and environment
///
/// `path`, when given, must exist; it overrides the embedded defaults and the
/// optional `config/local` file.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut builder = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. Local overrides (optional)
        .add_source(File::with_name("config/local").required(false));

    // 3. Explicit file
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }

    let config = builder
        // 4. Environment variables (highest priority), e.g. METRON_NAMESPACE
        .add_source(
            Environment::with_prefix("METRON")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}
