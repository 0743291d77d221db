//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for monitoring batch extraction,
//! [`CancellationToken`] for cooperative cancellation of an in-flight load,
//! and [`ProgressInfo`] for detailed progress snapshots.
//!
//! Progress callbacks run on the background context while a batch decodes.
//! Batch results themselves are only ever published on the interactive
//! context, through the loader's observer.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framepager::{LoaderOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("{pct:.1}% of batch decoded");
//!         }
//!     }
//! }
//!
//! let options = LoaderOptions::new().with_progress(Arc::new(PrintProgress));
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// A snapshot of batch extraction progress.
///
/// Delivered to [`ProgressCallback::on_progress`] at a cadence controlled
/// by [`LoaderOptions::with_progress_interval`](crate::LoaderOptions::with_progress_interval).
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// How many sample points have been attempted so far.
    pub current: u64,
    /// Sample points in the batch.
    pub total: u64,
    /// Completion percentage (0.0 – 100.0).
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the batch started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// The position currently being decoded, in seconds.
    pub current_seconds: Option<f64>,
}

/// Trait for receiving progress updates during extraction.
///
/// Implementations must be [`Send`] and [`Sync`] because callbacks are
/// invoked from the background context.
///
/// Progress callbacks are **infallible**: they observe but cannot halt
/// the load. Use [`CancellationToken`] or
/// [`FrameBatchLoader::cancel`](crate::FrameBatchLoader::cancel) for that.
pub trait ProgressCallback: Send + Sync {
    /// Called at regular intervals while a batch decodes.
    fn on_progress(&self, info: &ProgressInfo);
}

/// A no-op implementation that discards all progress notifications.
///
/// This is the default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// The loader hands one fresh token to every background load. The
/// extraction loop checks [`is_cancelled`](CancellationToken::is_cancelled)
/// before each frame.
///
/// # Example
///
/// ```
/// use framepager::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    ///
    /// All clones of this token will observe the cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks progress timing for one batch and emits callbacks.
pub struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: u64,
    current: u64,
    interval: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    /// Create a tracker for a batch of `total` sample points that reports
    /// every `interval` items.
    pub fn new(callback: Arc<dyn ProgressCallback>, total: u64, interval: u64) -> Self {
        Self {
            callback,
            total,
            current: 0,
            interval: interval.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// A tracker that reports nowhere.
    pub fn silent(total: u64) -> Self {
        Self::new(Arc::new(NoOpProgress), total, u64::MAX)
    }

    /// Record one attempted sample point and fire the callback if the
    /// interval is reached.
    pub fn advance(&mut self, seconds: f64) {
        self.current += 1;
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.interval {
            self.report(Some(seconds));
            self.items_since_last_report = 0;
        }
    }

    /// Unconditionally emit a final progress report.
    pub fn finish(&mut self) {
        self.report(None);
    }

    fn report(&self, seconds: Option<f64>) {
        let elapsed = self.start_time.elapsed();

        let percentage =
            (self.total > 0).then(|| (self.current as f32 / self.total as f32) * 100.0);

        let estimated_remaining = (self.current > 0).then(|| {
            let remaining = self.total.saturating_sub(self.current);
            let per_item = elapsed / self.current as u32;
            per_item * remaining as u32
        });

        let info = ProgressInfo {
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_seconds: seconds,
        };

        self.callback.on_progress(&info);
    }
}
