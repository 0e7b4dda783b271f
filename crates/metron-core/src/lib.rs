//! Metron Core - Metrics Facade
//!
//! This crate lets application code emit metrics without depending on a
//! particular metrics backend:
//! - Naming: deriving a stable dotted namespace from strings, types, values or modules
//! - Handles: `incr`, `gauge`, `timing`, `histogram` and timers under a namespace
//! - Registry: scoped installation of backend sinks and fan-out of records
//! - Testing: a capture sink for asserting on emitted metrics
//!
//! ```
//! use metron_core::{get_metrics, MetricKind, MetricsMock};
//!
//! struct Downloader {
//!     metrics: metron_core::MetricsHandle,
//! }
//!
//! impl Downloader {
//!     fn new() -> Self {
//!         Self {
//!             metrics: get_metrics(metron_core::Subject::of_type::<Self>(), ""),
//!         }
//!     }
//!
//!     fn fetch(&self) {
//!         let _timer = self.metrics.timer("fetch");
//!         self.metrics.incr("fetched");
//!     }
//! }
//!
//! let mm = MetricsMock::new();
//! let _capture = mm.install();
//!
//! let downloader = Downloader::new();
//! downloader.fetch();
//!
//! assert!(mm.has_record(Some(MetricKind::Incr), Some(&downloader.metrics.full_stat("fetched")), None));
//! assert!(mm.has_record(Some(MetricKind::Timing), None, None));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod handle;
pub mod naming;
pub mod record;
pub mod registry;
pub mod testing;
pub mod timer;

pub use handle::{get_metrics, MetricsHandle};
pub use naming::{normalize, resolve, Subject, BUILTIN_MODULE, UNNAMED};
pub use record::{Fields, MetricKind, ParseMetricKindError, Record};
pub use registry::{BackendRegistry, CurrentGuard, InstallGuard, MetricsSink};
pub use testing::MetricsMock;
pub use timer::{Timer, TimerDecorator, TimerGuard};
