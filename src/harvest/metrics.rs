//! Success/error tallying for batches of fallible work.
//!
//! [`Metrics`] is where a batch deliberately stops failures: a unit of work
//! run through one of the `tally*` methods is counted, its error (if any) is
//! handed to the optional handler, and nothing propagates past the call.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Monotonic success and error counters.
///
/// Counters are atomic, so one instance may be shared by concurrent workers.
#[derive(Debug, Default)]
pub struct Metrics {
    success_count: AtomicU64,
    error_count: AtomicU64,
}

/// Point-in-time copy of a [`Metrics`] instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub success_count: u64,
    pub error_count: u64,
    pub total: u64,
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed, {} total",
            self.success_count, self.error_count, self.total
        )
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self) {
        self.success_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.success_count() + self.error_count()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let success_count = self.success_count();
        let error_count = self.error_count();
        MetricsSnapshot {
            success_count,
            error_count,
            total: success_count + error_count,
        }
    }

    /// Runs `work`, counting the outcome. Returns `None` if it failed.
    pub fn tally<T, E, W>(&self, work: W) -> Option<T>
    where
        W: FnOnce() -> Result<T, E>,
    {
        self.record(work(), None::<fn(E)>)
    }

    /// Like [`Metrics::tally`], passing the error of a failed run to
    /// `on_error`.
    pub fn tally_with<T, E, W, H>(&self, on_error: H, work: W) -> Option<T>
    where
        W: FnOnce() -> Result<T, E>,
        H: FnOnce(E),
    {
        self.record(work(), Some(on_error))
    }

    /// Awaits `work`, counting the outcome. Returns `None` if it failed.
    pub async fn tally_async<T, E, F>(&self, work: F) -> Option<T>
    where
        F: Future<Output = Result<T, E>>,
    {
        self.record(work.await, None::<fn(E)>)
    }

    /// Like [`Metrics::tally_async`], passing the error of a failed run to
    /// `on_error`.
    pub async fn tally_async_with<T, E, F, H>(&self, on_error: H, work: F) -> Option<T>
    where
        F: Future<Output = Result<T, E>>,
        H: FnOnce(E),
    {
        self.record(work.await, Some(on_error))
    }

    fn record<T, E, H>(&self, outcome: Result<T, E>, on_error: Option<H>) -> Option<T>
    where
        H: FnOnce(E),
    {
        match outcome {
            Ok(value) => {
                self.success();
                Some(value)
            }
            Err(err) => {
                self.error();
                if let Some(handler) = on_error {
                    handler(err);
                }
                None
            }
        }
    }
}
