//! Batch model and the observer contract.
//!
//! A load cycle ends with exactly one [`BatchResult`] handed to the loader's
//! single [`BatchObserver`]: either a [`FrameBatch`] or a [`BatchFailure`].
//! Per-frame decode misses never become failures; they shorten the batch and
//! are listed in [`FrameBatch::skipped`].

use std::cell::RefCell;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::rc::{Rc, Weak};

use image::DynamicImage;

/// An inclusive range of whole seconds to sample, one frame per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleRange {
    /// First second sampled.
    pub start: u64,
    /// Last second sampled (inclusive).
    pub end: u64,
}

impl SampleRange {
    /// Build a range, swapping the bounds if they are reversed.
    pub fn new(start: u64, end: u64) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Range covering `[floor(from), floor(to)]` in whole seconds.
    ///
    /// Negative or non-finite bounds clamp to zero.
    pub fn between(from: f64, to: f64) -> Self {
        Self::new(whole_seconds(from), whole_seconds(to))
    }

    /// Number of sample points in the range.
    ///
    /// Saturates at `u64::MAX` for the full `u64` range.
    pub fn len(&self) -> u64 {
        (self.end - self.start).saturating_add(1)
    }

    /// A range always holds at least one sample point.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Sample points in ascending order.
    pub fn seconds(self) -> impl Iterator<Item = f64> {
        (self.start..=self.end).map(|second| second as f64)
    }
}

impl Display for SampleRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "[{}s, {}s]", self.start, self.end)
    }
}

fn whole_seconds(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    }
}

/// Which way the cursor moved for a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadDirection {
    /// Loaded through [`request_next`](crate::FrameBatchLoader::request_next).
    Forward,
    /// Loaded through [`request_previous`](crate::FrameBatchLoader::request_previous).
    Backward,
}

/// The frames produced by one successful load cycle.
#[derive(Debug, Clone)]
pub struct FrameBatch {
    /// Successfully decoded frames, in ascending time order.
    pub frames: Vec<DynamicImage>,
    /// The cursor reached or passed the video duration with this load.
    pub is_end: bool,
    /// The seconds that were sampled.
    pub range: SampleRange,
    /// Direction of the load that produced this batch.
    pub direction: LoadDirection,
    /// Seconds whose frame failed to decode, in ascending order.
    pub skipped: Vec<f64>,
}

impl FrameBatch {
    /// Number of frames in the batch.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if no frame in the range decoded.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The second each frame was sampled at, parallel to `frames`.
    pub fn timestamps(&self) -> Vec<f64> {
        self.range
            .seconds()
            .filter(|second| !self.skipped.contains(second))
            .collect()
    }
}

/// A load that failed as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    /// Human-readable description of what went wrong.
    pub description: String,
    /// The seconds the load tried to sample.
    pub range: SampleRange,
    /// Direction of the failed load.
    pub direction: LoadDirection,
}

impl Display for BatchFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "loading {} failed: {}", self.range, self.description)
    }
}

/// What the observer receives for each finished load.
pub type BatchResult = Result<FrameBatch, BatchFailure>;

/// The single subscriber of a [`FrameBatchLoader`](crate::FrameBatchLoader).
///
/// Called only on the interactive context, from
/// [`poll`](crate::FrameBatchLoader::poll) or
/// [`wait_timeout`](crate::FrameBatchLoader::wait_timeout), so
/// implementations need not be [`Send`].
///
/// Any `FnMut(BatchResult)` closure is an observer:
///
/// ```
/// use framepager::{BatchObserver, BatchResult};
///
/// let mut seen = 0;
/// let mut observer = |result: BatchResult| {
///     if result.is_ok() {
///         seen += 1;
///     }
/// };
/// # let _ = &mut observer as &mut dyn BatchObserver;
/// ```
pub trait BatchObserver {
    /// Receive the outcome of one load cycle.
    fn on_batch(&mut self, result: BatchResult);
}

impl<F> BatchObserver for F
where
    F: FnMut(BatchResult),
{
    fn on_batch(&mut self, result: BatchResult) {
        self(result)
    }
}

/// Back-reference delivery to an observer owned elsewhere.
///
/// Results go to the observer while it is alive and are dropped once its
/// last strong reference is gone.
#[derive(Debug)]
pub struct WeakObserver<O>(Weak<RefCell<O>>);

impl<O> WeakObserver<O> {
    /// Observe through a weak reference to `observer`.
    pub fn new(observer: &Rc<RefCell<O>>) -> Self {
        Self(Rc::downgrade(observer))
    }
}

impl<O: BatchObserver> BatchObserver for WeakObserver<O> {
    fn on_batch(&mut self, result: BatchResult) {
        match self.0.upgrade() {
            Some(observer) => observer.borrow_mut().on_batch(result),
            None => log::debug!("observer dropped, discarding batch result"),
        }
    }
}
