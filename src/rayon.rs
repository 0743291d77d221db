//! Parallel batch extraction.
//!
//! Used by [`Executor::Rayon`](crate::Executor). The sample points of one
//! batch are decoded across rayon threads; the source is shared read-only,
//! and results are folded back in ascending time order so the batch looks
//! exactly like a sequential one.

use std::sync::Mutex;

use ::rayon::iter::{IntoParallelIterator, ParallelIterator};
use image::DynamicImage;

use crate::batch::SampleRange;
use crate::error::FramePagerError;
use crate::extract::ExtractedFrames;
use crate::progress::{CancellationToken, ProgressTracker};
use crate::source::FrameSource;

/// Decode `range` in parallel.
///
/// Same contract as [`extract_range`](crate::extract_range): frame-local
/// errors are skipped, the first other error in time order aborts, and a
/// tripped token yields [`FramePagerError::Cancelled`].
pub(crate) fn parallel_extract_range(
    source: &dyn FrameSource,
    range: SampleRange,
    tracker: &mut ProgressTracker,
    cancellation: &CancellationToken,
) -> Result<ExtractedFrames, FramePagerError> {
    let seconds: Vec<f64> = range.seconds().collect();
    let tracker = Mutex::new(tracker);

    let outcomes: Vec<(f64, Result<DynamicImage, FramePagerError>)> = seconds
        .into_par_iter()
        .map(|second| {
            if cancellation.is_cancelled() {
                return (second, Err(FramePagerError::Cancelled));
            }
            let outcome = source.decode_frame(second);
            if let Ok(mut tracker) = tracker.lock() {
                tracker.advance(second);
            }
            (second, outcome)
        })
        .collect();

    let mut extracted = ExtractedFrames::default();
    for (second, outcome) in outcomes {
        extracted.push(second, outcome)?;
    }

    if let Ok(mut tracker) = tracker.lock() {
        tracker.finish();
    }
    Ok(extracted)
}
