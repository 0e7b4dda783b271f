//! Backend configuration
//!
//! Backends are described by a class name and an options table:
//!
//! ```toml
//! [[backends]]
//! class = "logging"
//! options = { logger_name = "metrics", msg_prefix = "METRICS" }
//!
//! [[backends]]
//! class = "metron_backends::DatadogCloudwatchMetrics"
//! ```
//!
//! Class names are matched on their last path segment, so `logging`,
//! `LoggingMetrics` and `metron_backends::LoggingMetrics` all select the same
//! backend.

use metron_core::{BackendRegistry, InstallGuard, MetricsSink};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::cloudwatch::{CloudwatchOptions, DatadogCloudwatchMetrics};
use crate::error::{Error, Result};
use crate::logging::{LoggingMetrics, LoggingOptions};

/// One configured backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend class name
    pub class: String,

    /// Backend-specific options
    #[serde(default)]
    pub options: toml::Table,
}

impl BackendConfig {
    /// Backend with no options
    #[must_use]
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            options: toml::Table::new(),
        }
    }

    /// Add an option
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    fn options_as<T: DeserializeOwned>(&self) -> Result<T> {
        toml::Value::Table(self.options.clone())
            .try_into()
            .map_err(|e: toml::de::Error| Error::InvalidOptions {
                class: self.class.clone(),
                message: e.message().to_string(),
            })
    }
}

/// Set of backends to install
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSettings {
    /// Backends, in installation order
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
}

impl MetricsSettings {
    /// Parse settings from TOML text
    pub fn load_from_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Last `.` or `::` separated segment of a class path.
fn class_name(class: &str) -> &str {
    class.rsplit(['.', ':']).next().unwrap_or(class)
}

/// Build the sink described by `config`
pub fn build_backend(config: &BackendConfig) -> Result<Arc<dyn MetricsSink>> {
    match class_name(&config.class) {
        "logging" | "LoggingMetrics" => {
            let options: LoggingOptions = config.options_as()?;
            Ok(Arc::new(LoggingMetrics::new(options)))
        }
        "cloudwatch" | "DatadogCloudwatchMetrics" => {
            let options: CloudwatchOptions = config.options_as()?;
            Ok(Arc::new(DatadogCloudwatchMetrics::new(options)))
        }
        _ => Err(Error::UnknownBackend(config.class.clone())),
    }
}

/// Backends installed by [`configure`]; dropping this uninstalls them
#[must_use = "dropping the configured backends uninstalls them immediately"]
#[derive(Debug, Default)]
pub struct ConfiguredBackends {
    guards: Vec<InstallGuard>,
    classes: Vec<String>,
}

impl ConfiguredBackends {
    /// Class names of the installed backends
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of installed backends
    #[must_use]
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// Whether no backend was installed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

/// Build every configured backend and install it into `registry`
///
/// A backend that fails to build is logged and skipped; the others are still
/// installed.
pub fn configure(registry: &BackendRegistry, configs: &[BackendConfig]) -> ConfiguredBackends {
    let mut configured = ConfiguredBackends::default();

    for config in configs {
        match build_backend(config) {
            Ok(sink) => {
                configured.guards.push(registry.install(sink));
                configured.classes.push(config.class.clone());
                info!(class = %config.class, "Metrics backend installed");
            }
            Err(e) => {
                error!(class = %config.class, error = %e, "Failed to configure metrics backend");
            }
        }
    }

    configured
}
