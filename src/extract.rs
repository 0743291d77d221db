//! Batch extraction: the background half of a load.
//!
//! Everything here is a function of its inputs. A load hands a
//! [`SampleRange`] and a shared [`FrameSource`] to [`extract_range`] and gets
//! back the frames that decoded, in ascending order, together with the
//! seconds that did not. No loader state is visible from here.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use image::DynamicImage;

use crate::batch::SampleRange;
use crate::error::FramePagerError;
use crate::progress::{CancellationToken, ProgressTracker};
use crate::source::FrameSource;

/// Upper bound on frames reserved ahead of decoding.
const PREALLOCATED_FRAMES: u64 = 64;

/// Frames recovered from one sample range.
#[derive(Debug, Clone, Default)]
pub struct ExtractedFrames {
    /// Decoded frames, ascending by time.
    pub frames: Vec<DynamicImage>,
    /// Seconds whose decode failed with a frame-local error, ascending.
    pub skipped: Vec<f64>,
}

impl ExtractedFrames {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            frames: Vec::with_capacity(capacity),
            skipped: Vec::new(),
        }
    }

    /// Fold one decode outcome in. Frame-local errors are recorded as a
    /// skip; any other error is returned to abort the batch.
    pub(crate) fn push(
        &mut self,
        seconds: f64,
        outcome: Result<DynamicImage, FramePagerError>,
    ) -> Result<(), FramePagerError> {
        match outcome {
            Ok(image) => self.frames.push(image),
            Err(error) if error.is_frame_local() => {
                log::trace!("skipping frame at {seconds}s: {error}");
                self.skipped.push(seconds);
            }
            Err(error) => return Err(error),
        }
        Ok(())
    }
}

/// Decode one frame per second of `range`, in order.
///
/// Cancellation is checked before every frame.
///
/// # Errors
///
/// - [`FramePagerError::Cancelled`] once `cancellation` is tripped.
/// - The first error from `source` that is not frame-local.
pub fn extract_range(
    source: &dyn FrameSource,
    range: SampleRange,
    tracker: &mut ProgressTracker,
    cancellation: &CancellationToken,
) -> Result<ExtractedFrames, FramePagerError> {
    let capacity = range.len().min(PREALLOCATED_FRAMES) as usize;
    let mut extracted = ExtractedFrames::with_capacity(capacity);

    for seconds in range.seconds() {
        if cancellation.is_cancelled() {
            return Err(FramePagerError::Cancelled);
        }
        extracted.push(seconds, source.decode_frame(seconds))?;
        tracker.advance(seconds);
    }

    tracker.finish();
    Ok(extracted)
}

/// Run an extraction, turning a panic in the source into an error so the
/// loader always hears back from its job.
pub(crate) fn extract_guarded(
    source: &dyn FrameSource,
    range: SampleRange,
    tracker: &mut ProgressTracker,
    cancellation: &CancellationToken,
    parallel: bool,
) -> Result<ExtractedFrames, FramePagerError> {
    catch_unwind(AssertUnwindSafe(|| {
        dispatch(source, range, tracker, cancellation, parallel)
    }))
    .unwrap_or_else(|payload| Err(FramePagerError::WorkerPanicked(panic_message(&*payload))))
}

#[cfg(feature = "rayon")]
fn dispatch(
    source: &dyn FrameSource,
    range: SampleRange,
    tracker: &mut ProgressTracker,
    cancellation: &CancellationToken,
    parallel: bool,
) -> Result<ExtractedFrames, FramePagerError> {
    if parallel {
        crate::rayon::parallel_extract_range(source, range, tracker, cancellation)
    } else {
        extract_range(source, range, tracker, cancellation)
    }
}

#[cfg(not(feature = "rayon"))]
fn dispatch(
    source: &dyn FrameSource,
    range: SampleRange,
    tracker: &mut ProgressTracker,
    cancellation: &CancellationToken,
    _parallel: bool,
) -> Result<ExtractedFrames, FramePagerError> {
    extract_range(source, range, tracker, cancellation)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
