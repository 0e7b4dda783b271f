//! Metron Backends - Metrics Sinks
//!
//! Concrete [`metron_core::MetricsSink`] implementations and the
//! configuration layer that builds and installs them:
//! - Logging: records as `tracing` events
//! - CloudWatch: Datadog `MONITORING|...` lines for AWS Lambda
//! - Config: class/options descriptions and scoped installation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cloudwatch;
pub mod config;
pub mod error;
pub mod logging;

pub use cloudwatch::{CloudwatchOptions, DatadogCloudwatchMetrics, Output};
pub use config::{build_backend, configure, BackendConfig, ConfiguredBackends, MetricsSettings};
pub use error::{Error, Result};
pub use logging::{LoggingMetrics, LoggingOptions};
