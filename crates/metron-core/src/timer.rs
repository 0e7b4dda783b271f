//! Timing helpers built on [`MetricsHandle::timing`]

use std::fmt;
use std::time::{Duration, Instant};

use crate::handle::MetricsHandle;

/// Timer for measuring durations
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Time since the timer started
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Get elapsed time in milliseconds
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// Emits a timing for its own lifetime
///
/// The timing is recorded when the guard drops, including while unwinding
/// from a panic. The panic itself keeps propagating.
#[must_use = "the timing is recorded when the guard is dropped"]
pub struct TimerGuard {
    handle: MetricsHandle,
    stat: String,
    timer: Timer,
}

impl TimerGuard {
    pub(crate) fn new(handle: MetricsHandle, stat: &str) -> Self {
        Self {
            handle,
            stat: stat.to_string(),
            timer: Timer::start(),
        }
    }

    /// Milliseconds elapsed so far
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.timer.elapsed_ms()
    }
}

impl fmt::Debug for TimerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerGuard")
            .field("stat", &self.handle.full_stat(&self.stat))
            .field("elapsed_ms", &self.elapsed_ms())
            .finish()
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.handle.timing(&self.stat, self.timer.elapsed_ms());
    }
}

/// Wraps functions so every call is timed under one stat
///
/// ```
/// # let metrics = metron_core::get_metrics("myapp", "");
/// let timed = metrics.timer_decorator("long_function");
/// let long_function = timed.wrap(|| "done");
/// assert_eq!(long_function(), "done");
///
/// let add = timed.wrap_arg(|(a, b): (i32, i32)| a + b);
/// assert_eq!(add((2, 3)), 5);
/// ```
#[derive(Debug, Clone)]
pub struct TimerDecorator {
    handle: MetricsHandle,
    stat: String,
}

impl TimerDecorator {
    pub(crate) fn new(handle: MetricsHandle, stat: &str) -> Self {
        Self {
            handle,
            stat: stat.to_string(),
        }
    }

    /// Wrap a function taking no arguments
    pub fn wrap<F, R>(&self, f: F) -> impl Fn() -> R
    where
        F: Fn() -> R,
    {
        let decorator = self.clone();
        move || decorator.call(&f)
    }

    /// Wrap a function taking one argument; use a tuple for several
    pub fn wrap_arg<F, A, R>(&self, f: F) -> impl Fn(A) -> R
    where
        F: Fn(A) -> R,
    {
        let decorator = self.clone();
        move |arg| decorator.call(|| f(arg))
    }

    /// Call `f` once under this decorator's timer
    pub fn call<R>(&self, f: impl FnOnce() -> R) -> R {
        let _timer = self.handle.timer(&self.stat);
        f()
    }
}
