//! Backend registry
//!
//! A [`BackendRegistry`] is a stack of active [`MetricsSink`]s. Sinks are only
//! ever added through [`BackendRegistry::install`], which hands back an
//! [`InstallGuard`]; dropping the guard removes that sink again, on every exit
//! path including unwinding and early returns.
//!
//! Each thread has its own *current* registry (see
//! [`BackendRegistry::current`]), so tests running on separate threads never
//! see each other's sinks. Use [`BackendRegistry::enter`] to share one
//! registry across threads.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::handle::MetricsHandle;
use crate::naming::{resolve, Subject};
use crate::record::{Fields, MetricKind, Record};

/// A consumer of recorded metrics
///
/// Implementations should not panic for well-formed records. A panicking sink
/// is surfaced to the code that emitted the metric.
pub trait MetricsSink: Send + Sync {
    /// Handle one emission
    fn record(&self, record: &Record);
}

struct SinkEntry {
    id: u64,
    sink: Arc<dyn MetricsSink>,
}

#[derive(Default)]
struct RegistryInner {
    sinks: RwLock<Vec<SinkEntry>>,
    next_id: AtomicU64,
}

/// Stack of active metrics sinks
#[derive(Clone, Default)]
pub struct BackendRegistry {
    inner: Arc<RegistryInner>,
}

thread_local! {
    static CURRENT: RefCell<BackendRegistry> = RefCell::new(BackendRegistry::new());
}

impl BackendRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The calling thread's current registry
    #[must_use]
    pub fn current() -> Self {
        CURRENT.with(|current| current.borrow().clone())
    }

    /// Make this registry the calling thread's current one until the guard drops
    pub fn enter(&self) -> CurrentGuard {
        let previous = CURRENT.with(|current| current.replace(self.clone()));
        CurrentGuard {
            previous: Some(previous),
            _not_send: PhantomData,
        }
    }

    /// Push a sink onto the stack
    ///
    /// The sink stays active until the returned guard is dropped.
    pub fn install(&self, sink: Arc<dyn MetricsSink>) -> InstallGuard {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let mut sinks = self.inner.sinks.write().unwrap_or_else(|e| e.into_inner());
        sinks.push(SinkEntry { id, sink });
        debug!(sink_id = id, active = sinks.len(), "Metrics sink installed");
        drop(sinks);

        InstallGuard {
            registry: self.clone(),
            id,
        }
    }

    /// Forward a record to every active sink, most recently installed first
    pub fn record(&self, kind: MetricKind, name: &str, fields: Fields) {
        let sinks = self.snapshot();
        if sinks.is_empty() {
            return;
        }

        let record = Record::new(kind, name, fields);
        for sink in sinks.iter().rev() {
            sink.record(&record);
        }
    }

    /// Number of active sinks
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .sinks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Whether no sink is active
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether both values refer to the same registry
    #[must_use]
    pub fn same_registry(&self, other: &BackendRegistry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Create a metrics handle that emits into this registry
    pub fn get_metrics<'a>(&self, thing: impl Into<Subject<'a>>, extra: &str) -> MetricsHandle {
        MetricsHandle::with_registry(resolve(thing, extra), self.clone())
    }

    // Copy of the stack so sinks run without holding the lock; a sink may
    // record or install on this registry itself.
    fn snapshot(&self) -> Vec<Arc<dyn MetricsSink>> {
        self.inner
            .sinks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|entry| Arc::clone(&entry.sink))
            .collect()
    }

    fn uninstall(&self, id: u64) {
        let mut sinks = self.inner.sinks.write().unwrap_or_else(|e| e.into_inner());
        let removed = sinks
            .iter()
            .position(|entry| entry.id == id)
            .map(|pos| sinks.remove(pos));
        let active = sinks.len();
        drop(sinks);

        // Dropped after the lock is released; the sink may be the last owner.
        if removed.is_some() {
            debug!(sink_id = id, active, "Metrics sink uninstalled");
        }
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("sinks", &self.len())
            .finish()
    }
}

/// Keeps a sink installed; dropping it uninstalls the sink
#[must_use = "dropping the guard uninstalls the sink immediately"]
pub struct InstallGuard {
    registry: BackendRegistry,
    id: u64,
}

impl InstallGuard {
    /// Registry the sink was installed into
    #[must_use]
    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }
}

impl fmt::Debug for InstallGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallGuard").field("id", &self.id).finish()
    }
}

impl Drop for InstallGuard {
    fn drop(&mut self) {
        self.registry.uninstall(self.id);
    }
}

/// Restores the previous current registry when dropped
#[must_use = "dropping the guard restores the previous registry immediately"]
pub struct CurrentGuard {
    previous: Option<BackendRegistry>,
    // Thread-local state must be restored on the thread that set it.
    _not_send: PhantomData<*const ()>,
}

impl fmt::Debug for CurrentGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentGuard").finish_non_exhaustive()
    }
}

impl Drop for CurrentGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            // The thread-local may already be gone during thread teardown.
            let _ = CURRENT.try_with(|current| current.replace(previous));
        }
    }
}
