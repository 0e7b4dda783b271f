//! Capture harness for asserting on emitted metrics in tests
//!
//! ```
//! use metron_core::testing::MetricsMock;
//! use metron_core::{get_metrics, MetricKind};
//! use serde_json::json;
//!
//! let metrics = get_metrics("thing", "");
//! let mm = MetricsMock::new();
//! {
//!     let _capture = mm.install();
//!     metrics.incr_by("foo", 5);
//! }
//!
//! assert!(mm.has_record(Some(MetricKind::Incr), Some("thing.foo"), Some(&json!({"value": 5}))));
//! ```

use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::record::{MetricKind, Record};
use crate::registry::{BackendRegistry, InstallGuard, MetricsSink};

/// Sink that keeps every record it receives
///
/// Clones share the same record list, so a test can keep querying after the
/// capture scope has ended.
#[derive(Clone, Default)]
pub struct MetricsMock {
    records: Arc<Mutex<Vec<Record>>>,
}

impl MetricsMock {
    /// Create an empty mock
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start capturing on the calling thread's current registry
    ///
    /// Previously captured records are discarded.
    pub fn install(&self) -> InstallGuard {
        self.install_into(&BackendRegistry::current())
    }

    /// Start capturing on `registry`
    pub fn install_into(&self, registry: &BackendRegistry) -> InstallGuard {
        self.clear();
        registry.install(Arc::new(self.clone()))
    }

    /// All captured records in emission order
    #[must_use]
    pub fn get_records(&self) -> Vec<Record> {
        self.lock().clone()
    }

    /// Records matching every given filter
    ///
    /// `kwargs_contains` must be a JSON object; a record matches when its
    /// fields contain all of the object's entries. A non-object filter
    /// matches nothing.
    #[must_use]
    pub fn filter_records(
        &self,
        fun_name: Option<MetricKind>,
        stat: Option<&str>,
        kwargs_contains: Option<&Value>,
    ) -> Vec<Record> {
        self.lock()
            .iter()
            .filter(|record| fun_name.map_or(true, |kind| record.kind == kind))
            .filter(|record| stat.map_or(true, |name| record.name == name))
            .filter(|record| match kwargs_contains {
                None => true,
                Some(Value::Object(expected)) => record.fields_contain(expected),
                Some(_) => false,
            })
            .cloned()
            .collect()
    }

    /// Whether any record matches every given filter
    #[must_use]
    pub fn has_record(
        &self,
        fun_name: Option<MetricKind>,
        stat: Option<&str>,
        kwargs_contains: Option<&Value>,
    ) -> bool {
        !self.filter_records(fun_name, stat, kwargs_contains).is_empty()
    }

    /// Log every captured record (handy when a test assertion fails)
    pub fn print_records(&self) {
        for record in self.lock().iter() {
            info!("{}", record);
        }
    }

    /// Number of captured records
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been captured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Discard captured records
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Record>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MetricsSink for MetricsMock {
    fn record(&self, record: &Record) {
        self.lock().push(record.clone());
    }
}

impl fmt::Debug for MetricsMock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsMock")
            .field("records", &self.len())
            .finish()
    }
}
