//! Loader and frame output configuration.
//!
//! [`LoaderOptions`] is a builder that threads the batch size, the
//! background executor, and progress reporting into a
//! [`FrameBatchLoader`](crate::FrameBatchLoader) without polluting its
//! constructor. [`FrameOutputOptions`] controls what the bundled FFmpeg
//! source hands back: pixel format and a bounding box for the frames.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framepager::{Executor, LoaderOptions, ProgressCallback, ProgressInfo};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{}/{} frames", info.current, info.total);
//!     }
//! }
//!
//! let options = LoaderOptions::new()
//!     .with_batch_seconds(24.0)
//!     .with_executor(Executor::Thread)
//!     .with_progress(Arc::new(LogProgress))
//!     .with_progress_interval(8);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

#[cfg(feature = "ffmpeg")]
use ffmpeg_next::format::Pixel;

use crate::executor::Executor;
use crate::progress::{NoOpProgress, ProgressCallback};
use crate::state::DEFAULT_BATCH_SECONDS;

/// Bounding box applied to frames when none is configured. Frames are
/// presented as small cells, so full-resolution decodes would be wasted.
pub const DEFAULT_MAX_DIMENSION: u32 = 200;

/// Output pixel format for decoded frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit RGB (24 bpp). This is the default.
    #[default]
    Rgb8,
    /// 8-bit RGBA with alpha pre-set to 255 (32 bpp).
    Rgba8,
    /// 8-bit grayscale (8 bpp).
    Gray8,
}

impl PixelFormat {
    /// Map to the corresponding FFmpeg pixel format constant.
    #[cfg(feature = "ffmpeg")]
    pub(crate) fn to_ffmpeg_pixel(self) -> Pixel {
        match self {
            PixelFormat::Rgb8 => Pixel::RGB24,
            PixelFormat::Rgba8 => Pixel::RGBA,
            PixelFormat::Gray8 => Pixel::GRAY8,
        }
    }

    /// Bytes per pixel in a tightly packed buffer.
    #[cfg(feature = "ffmpeg")]
    pub(crate) fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// Frame output settings for the FFmpeg source.
///
/// Frames are scaled down to fit inside `max_width` × `max_height` with the
/// source aspect ratio preserved; frames already inside the box keep their
/// size. `None` leaves that axis unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct FrameOutputOptions {
    /// Output pixel format.
    pub pixel_format: PixelFormat,
    /// Maximum output width. `None` keeps the source width.
    pub max_width: Option<u32>,
    /// Maximum output height. `None` keeps the source height.
    pub max_height: Option<u32>,
}

impl Default for FrameOutputOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameOutputOptions {
    /// RGB8 frames bounded to 200×200.
    pub fn new() -> Self {
        Self {
            pixel_format: PixelFormat::Rgb8,
            max_width: Some(DEFAULT_MAX_DIMENSION),
            max_height: Some(DEFAULT_MAX_DIMENSION),
        }
    }

    /// Set the output pixel format.
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = format;
        self
    }

    /// Set the bounding box. Pass `None` for an unbounded axis.
    pub fn with_max_dimensions(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.max_width = width;
        self.max_height = height;
        self
    }

    /// Resolve the output dimensions for a source of the given size.
    ///
    /// Returns `(width, height)`, each at least 1.
    pub fn resolve_dimensions(&self, source_width: u32, source_height: u32) -> (u32, u32) {
        if source_width == 0 || source_height == 0 {
            return (source_width.max(1), source_height.max(1));
        }

        let scale_x = self
            .max_width
            .map_or(1.0, |w| w as f64 / source_width as f64);
        let scale_y = self
            .max_height
            .map_or(1.0, |h| h as f64 / source_height as f64);
        let scale = scale_x.min(scale_y).min(1.0);

        let width = (source_width as f64 * scale).round() as u32;
        let height = (source_height as f64 * scale).round() as u32;
        (width.max(1), height.max(1))
    }
}

/// Configuration for a [`FrameBatchLoader`](crate::FrameBatchLoader).
///
/// A default-constructed value pages 48 seconds at a time on a dedicated
/// background thread with no progress reporting.
#[derive(Clone)]
#[must_use]
pub struct LoaderOptions {
    /// Seconds the cursor moves per load.
    pub(crate) batch_seconds: f64,
    /// Where background extraction runs.
    pub(crate) executor: Executor,
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Fire the progress callback every N frames.
    pub(crate) progress_interval: u64,
}

impl Debug for LoaderOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("LoaderOptions")
            .field("batch_seconds", &self.batch_seconds)
            .field("executor", &self.executor)
            .field("progress_interval", &self.progress_interval)
            .finish_non_exhaustive()
    }
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl LoaderOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            batch_seconds: DEFAULT_BATCH_SECONDS,
            executor: Executor::default(),
            progress: Arc::new(NoOpProgress),
            progress_interval: 1,
        }
    }

    /// Set how many seconds each load advances or retreats the cursor.
    ///
    /// Must lie between one second and
    /// [`MAX_BATCH_SECONDS`](crate::MAX_BATCH_SECONDS); the loader
    /// constructor rejects anything else with
    /// [`FramePagerError::InvalidBatchSize`](crate::FramePagerError::InvalidBatchSize).
    pub fn with_batch_seconds(mut self, seconds: f64) -> Self {
        self.batch_seconds = seconds;
        self
    }

    /// Choose the background execution context.
    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    /// Attach a progress callback, invoked on the background context.
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set how often the progress callback fires.
    ///
    /// A value of 1 means every frame; 10 means every 10th frame.
    /// Clamped to a minimum of 1.
    pub fn with_progress_interval(mut self, frames: u64) -> Self {
        self.progress_interval = frames.max(1);
        self
    }

    /// Seconds each load moves the cursor.
    pub fn batch_seconds(&self) -> f64 {
        self.batch_seconds
    }
}
