//! Error types for the `framepager` crate.
//!
//! [`FramePagerError`] is the single error type returned by every fallible
//! operation in the crate, from opening a frame source to decoding a single
//! frame. Variants split into two levels, see
//! [`is_frame_local`](FramePagerError::is_frame_local): frame-local errors
//! only cost the batch one frame, everything else fails the whole batch.

use std::{io::Error as IoError, path::PathBuf};

#[cfg(feature = "ffmpeg")]
use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `framepager` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramePagerError {
    /// The media file could not be opened.
    #[error("Failed to open video source at {path}: {reason}")]
    SourceOpen {
        /// Path that was passed to the source constructor.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The source can no longer serve any frame.
    #[error("Video source unavailable: {0}")]
    SourceUnavailable(String),

    /// A single frame could not be decoded.
    #[error("Failed to decode frame at {seconds:.3}s: {reason}")]
    FrameDecode {
        /// Requested position in seconds.
        seconds: f64,
        /// Underlying reason the decode failed.
        reason: String,
    },

    /// The requested time lies outside the video.
    #[error("Invalid timestamp: {0:.3}s")]
    InvalidTimestamp(f64),

    /// An error originating from the FFmpeg libraries.
    #[cfg(feature = "ffmpeg")]
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An error from the `image` crate during frame conversion.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// An I/O error occurred while reading the source.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// The load was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// The background job panicked before producing a result.
    #[error("Background worker panicked: {0}")]
    WorkerPanicked(String),

    /// The executor discarded the background job before it ran to the end,
    /// for example because its runtime had shut down.
    #[error("Background job was dropped before it completed")]
    JobDropped,

    /// A loader was configured with an unusable batch size.
    #[error("Invalid batch size: {0} (must be between 1 and 86400 seconds)")]
    InvalidBatchSize(f64),
}

impl FramePagerError {
    /// Returns `true` when the error concerns one frame only.
    ///
    /// Frame-local errors are dropped from a batch; any other error raised
    /// while decoding aborts the batch and is reported to the observer as a
    /// [`BatchFailure`](crate::BatchFailure).
    pub fn is_frame_local(&self) -> bool {
        match self {
            FramePagerError::FrameDecode { .. }
            | FramePagerError::InvalidTimestamp(_)
            | FramePagerError::ImageError(_) => true,
            #[cfg(feature = "ffmpeg")]
            FramePagerError::FfmpegError(_) => true,
            _ => false,
        }
    }
}

#[cfg(feature = "ffmpeg")]
impl From<FfmpegError> for FramePagerError {
    fn from(error: FfmpegError) -> Self {
        FramePagerError::FfmpegError(error.to_string())
    }
}
