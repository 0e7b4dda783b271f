//! Datadog CloudWatch backend
//!
//! Writes one line per record in the format the Datadog AWS Lambda
//! integration scrapes from CloudWatch logs:
//!
//! ```text
//! MONITORING|unix_epoch_timestamp|value|metric_type|my.metric.name|#tag1:value,tag2
//! ```
//!
//! Datadog only understands counts and gauges here, so timings and histograms
//! are written as gauges.

use chrono::Utc;
use metron_core::{MetricKind, MetricsSink, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;
use tracing::warn;

/// Stream the lines are written to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Output {
    /// Standard output (what CloudWatch captures by default)
    #[default]
    Stdout,
    /// Standard error
    Stderr,
}

/// Options for [`DatadogCloudwatchMetrics`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CloudwatchOptions {
    /// Output stream
    #[serde(default)]
    pub output: Output,
}

/// Sink writing Datadog `MONITORING|...` lines
pub struct DatadogCloudwatchMetrics {
    out: Mutex<Box<dyn Write + Send>>,
}

impl DatadogCloudwatchMetrics {
    /// Create a sink for the configured output stream
    #[must_use]
    pub fn new(options: CloudwatchOptions) -> Self {
        match options.output {
            Output::Stdout => Self::with_writer(io::stdout()),
            Output::Stderr => Self::with_writer(io::stderr()),
        }
    }

    /// Create a sink writing to `writer`
    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
        }
    }

    /// Line written for a record at `timestamp` (seconds since the epoch)
    #[must_use]
    pub fn format_line(record: &Record, timestamp: i64) -> String {
        let tags = record.tags();
        let tags = if tags.is_empty() {
            String::new()
        } else {
            format!("#{}", tags.join(","))
        };

        format!(
            "MONITORING|{}|{}|{}|{}|{}",
            timestamp,
            render_value(record.value()),
            metric_type(record.kind),
            record.name,
            tags
        )
    }
}

fn metric_type(kind: MetricKind) -> &'static str {
    match kind {
        MetricKind::Incr => "count",
        MetricKind::Gauge | MetricKind::Timing | MetricKind::Histogram => "gauge",
    }
}

fn render_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

impl MetricsSink for DatadogCloudwatchMetrics {
    fn record(&self, record: &Record) {
        let line = Self::format_line(record, Utc::now().timestamp());
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            warn!(error = %e, stat = %record.name, "Failed to write CloudWatch metrics line");
        }
    }
}

impl fmt::Debug for DatadogCloudwatchMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatadogCloudwatchMetrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_format_incr_as_count() {
        let record = Record::from_json(MetricKind::Incr, "foo", json!({"value": 10}));
        assert_eq!(
            DatadogCloudwatchMetrics::format_line(&record, 1_500_000_000),
            "MONITORING|1500000000|10|count|foo|"
        );
    }

    #[test]
    fn test_format_other_kinds_as_gauge() {
        for (kind, value) in [
            (MetricKind::Gauge, 100),
            (MetricKind::Timing, 1234),
            (MetricKind::Histogram, 4321),
        ] {
            let record = Record::from_json(kind, "foo", json!({ "value": value }));
            assert_eq!(
                DatadogCloudwatchMetrics::format_line(&record, 1),
                format!("MONITORING|1|{}|gauge|foo|", value)
            );
        }
    }

    #[test]
    fn test_format_tags() {
        let record = Record::from_json(
            MetricKind::Incr,
            "foo",
            json!({"value": 1, "tags": ["key1:val", "key2"]}),
        );
        assert_eq!(
            DatadogCloudwatchMetrics::format_line(&record, 7),
            "MONITORING|7|1|count|foo|#key1:val,key2"
        );
    }

    #[test]
    fn test_record_writes_line() {
        let buffer = SharedBuffer::default();
        let sink = DatadogCloudwatchMetrics::with_writer(buffer.clone());

        sink.record(&Record::from_json(
            MetricKind::Gauge,
            "app.queue",
            json!({"value": 2.5}),
        ));

        let written = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(written.starts_with("MONITORING|"), "{}", written);
        assert!(written.ends_with("|2.5|gauge|app.queue|\n"), "{}", written);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let sink = DatadogCloudwatchMetrics::with_writer(BrokenPipe);
        sink.record(&Record::from_json(MetricKind::Incr, "foo", json!({"value": 1})));
    }
}
