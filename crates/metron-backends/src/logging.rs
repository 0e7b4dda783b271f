//! Logging backend
//!
//! Emits every record as an `info` event on the `metrics` tracing target:
//!
//! ```text
//! INFO metrics: METRICS INCR: myapp.requests {"value":1} logger=metrics
//! ```
//!
//! ## Configuration
//!
//! ```toml
//! [[backends]]
//! class = "logging"
//!
//! [backends.options]
//! logger_name = "metrics"  # recorded as the `logger` field
//! msg_prefix = "METRICS"   # prefix of every message
//! ```

use metron_core::{MetricsSink, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Default value of the `logger` field
pub const DEFAULT_LOGGER_NAME: &str = "metrics";

/// Default message prefix
pub const DEFAULT_MSG_PREFIX: &str = "METRICS";

/// Options for [`LoggingMetrics`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingOptions {
    /// Name recorded in the `logger` field of each event
    #[serde(default = "default_logger_name")]
    pub logger_name: String,

    /// Prefix written before the metric kind
    #[serde(default = "default_msg_prefix")]
    pub msg_prefix: String,
}

fn default_logger_name() -> String {
    DEFAULT_LOGGER_NAME.to_string()
}

fn default_msg_prefix() -> String {
    DEFAULT_MSG_PREFIX.to_string()
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            logger_name: default_logger_name(),
            msg_prefix: default_msg_prefix(),
        }
    }
}

/// Sink that logs every record through `tracing`
#[derive(Debug, Clone, Default)]
pub struct LoggingMetrics {
    options: LoggingOptions,
}

impl LoggingMetrics {
    /// Create a logging sink
    #[must_use]
    pub fn new(options: LoggingOptions) -> Self {
        Self { options }
    }

    /// Options in effect
    #[must_use]
    pub fn options(&self) -> &LoggingOptions {
        &self.options
    }

    /// Message logged for a record
    #[must_use]
    pub fn format_message(&self, record: &Record) -> String {
        format!(
            "{} {}: {} {}",
            self.options.msg_prefix,
            record.kind.as_str().to_uppercase(),
            record.name,
            Value::Object(record.fields.clone())
        )
    }
}

impl MetricsSink for LoggingMetrics {
    fn record(&self, record: &Record) {
        info!(
            target: "metrics",
            logger = %self.options.logger_name,
            "{}",
            self.format_message(record)
        );
    }
}
