//! Metrics handles
//!
//! A [`MetricsHandle`] is what application code holds on to. It carries a
//! resolved namespace and the registry it emits into, and can be created long
//! before any backend is installed:
//!
//! ```
//! use metron_core::get_metrics;
//!
//! let metrics = get_metrics("myapp", "");
//! metrics.incr("started");
//! metrics.gauge("queue_size", 12);
//! ```

use serde_json::Value;
use std::fmt;

use crate::naming::{normalize, resolve, Subject};
use crate::record::{Fields, MetricKind};
use crate::registry::BackendRegistry;
use crate::timer::{TimerDecorator, TimerGuard};

/// Interface for emitting metrics under a fixed namespace
#[derive(Clone)]
pub struct MetricsHandle {
    name: String,
    registry: BackendRegistry,
    tags: Vec<String>,
}

impl MetricsHandle {
    /// Resolve `thing` and bind the handle to the calling thread's current registry
    pub fn new<'a>(thing: impl Into<Subject<'a>>, extra: &str) -> Self {
        Self::with_registry(resolve(thing, extra), BackendRegistry::current())
    }

    pub(crate) fn with_registry(name: String, registry: BackendRegistry) -> Self {
        Self {
            name,
            registry,
            tags: Vec::new(),
        }
    }

    /// Resolved namespace
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry this handle emits into
    #[must_use]
    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Tags attached to every emission
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Handle with the same namespace that also attaches `tags`
    ///
    /// Tags are `key:value` strings such as `env:stage`.
    #[must_use]
    pub fn with_tags<I, S>(&self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut handle = self.clone();
        handle.tags.extend(tags.into_iter().map(Into::into));
        handle
    }

    /// Full stat name for a leaf
    #[must_use]
    pub fn full_stat(&self, stat: &str) -> String {
        format!("{}.{}", self.name, normalize(stat))
    }

    /// Increment a counter by one
    pub fn incr(&self, stat: &str) {
        self.incr_by(stat, 1);
    }

    /// Increment a counter by `value`
    pub fn incr_by(&self, stat: &str, value: impl Into<Value>) {
        self.emit(MetricKind::Incr, stat, value.into());
    }

    /// Record the current value of something (queue size, memory in use, ...)
    pub fn gauge(&self, stat: &str, value: impl Into<Value>) {
        self.emit(MetricKind::Gauge, stat, value.into());
    }

    /// Record a duration in milliseconds
    pub fn timing(&self, stat: &str, value: impl Into<Value>) {
        self.emit(MetricKind::Timing, stat, value.into());
    }

    /// Record a value into a distribution
    pub fn histogram(&self, stat: &str, value: impl Into<Value>) {
        self.emit(MetricKind::Histogram, stat, value.into());
    }

    /// Time the enclosing scope; the timing is emitted when the guard drops
    ///
    /// ```
    /// # let metrics = metron_core::get_metrics("myapp", "");
    /// {
    ///     let _timer = metrics.timer("long_function");
    ///     // work being measured
    /// }
    /// ```
    pub fn timer(&self, stat: &str) -> TimerGuard {
        TimerGuard::new(self.clone(), stat)
    }

    /// Build a decorator that times every call of the functions it wraps
    #[must_use]
    pub fn timer_decorator(&self, stat: &str) -> TimerDecorator {
        TimerDecorator::new(self.clone(), stat)
    }

    /// Run `f` once under a timer and return its result
    pub fn time<R>(&self, stat: &str, f: impl FnOnce() -> R) -> R {
        let _timer = self.timer(stat);
        f()
    }

    fn emit(&self, kind: MetricKind, stat: &str, value: Value) {
        if self.registry.is_empty() {
            return;
        }

        let mut fields = Fields::new();
        fields.insert("value".to_string(), value);
        if !self.tags.is_empty() {
            fields.insert("tags".to_string(), Value::from(self.tags.clone()));
        }
        self.registry.record(kind, &self.full_stat(stat), fields);
    }
}

impl fmt::Debug for MetricsHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsHandle")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// Get a metrics handle named after `thing`
///
/// `thing` may be a string, a [`Subject`] built from a type, value or module
/// path, a primitive, or nothing at all; `extra` is appended as a final
/// segment when non-empty. The handle emits into the calling thread's
/// current registry.
pub fn get_metrics<'a>(thing: impl Into<Subject<'a>>, extra: &str) -> MetricsHandle {
    MetricsHandle::new(thing, extra)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MetricsMock;
    use serde_json::json;

    #[test]
    fn test_full_stat_normalizes_leaf() {
        let metrics = get_metrics("thing", "");
        assert_eq!(metrics.full_stat("foo"), "thing.foo");
        assert_eq!(metrics.full_stat("..a(b).."), "thing.a.b");
        assert_eq!(metrics.full_stat(""), "thing.unnamed");
    }

    #[test]
    fn test_with_tags_adds_tags_field() {
        let registry = BackendRegistry::new();
        let mm = MetricsMock::new();
        let _guard = mm.install_into(&registry);

        let metrics = registry.get_metrics("thing", "");
        let tagged = metrics.with_tags(["env:stage"]).with_tags(vec!["region:eu".to_string()]);
        tagged.incr("foo");
        metrics.incr("foo");

        let records = mm.get_records();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].fields,
            *json!({"value": 1, "tags": ["env:stage", "region:eu"]})
                .as_object()
                .unwrap()
        );
        assert_eq!(records[1].fields, *json!({"value": 1}).as_object().unwrap());
        assert!(metrics.tags().is_empty());
    }

    #[test]
    fn test_emitting_without_sinks_is_a_no_op() {
        let metrics = BackendRegistry::new().get_metrics("quiet", "");
        metrics.incr("a");
        metrics.gauge("b", 1);
        metrics.timing("c", 1.5);
        metrics.histogram("d", 2);
        assert!(metrics.registry().is_empty());
    }

    #[test]
    fn test_time_returns_closure_result() {
        let registry = BackendRegistry::new();
        let mm = MetricsMock::new();
        let _guard = mm.install_into(&registry);

        let metrics = registry.get_metrics("thing", "");
        let answer = metrics.time("compute", || 6 * 7);

        assert_eq!(answer, 42);
        assert!(mm.has_record(Some(MetricKind::Timing), Some("thing.compute"), None));
    }

    #[test]
    fn test_handle_binds_current_registry() {
        let registry = BackendRegistry::new();
        let _entered = registry.enter();

        let metrics = get_metrics("bound", "");
        assert!(metrics.registry().same_registry(&registry));
    }
}
