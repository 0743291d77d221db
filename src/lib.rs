//! # framepager
//!
//! Page through the frames of a video the way a scrolling thumbnail strip
//! does: one batch of stills at a time, the next batch loaded only when the
//! user nears the end of what is on screen.
//!
//! The crate is built around three pieces:
//!
//! - a pure pagination state machine ([`reduce`] over [`PaginationState`])
//!   that tracks the time cursor, the end-of-stream flag, and the
//!   single-flight guard;
//! - a [`FrameBatchLoader`] that owns that state on the interactive thread,
//!   decodes each batch on a background [`Executor`], and hands the result
//!   back to one [`BatchObserver`];
//! - the [`FrameSource`] capability it decodes from, with an FFmpeg-backed
//!   implementation in [`FfmpegFrameSource`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use framepager::{BatchResult, FfmpegFrameSource, FrameBatchLoader};
//!
//! let source = FfmpegFrameSource::open("input.mp4")?;
//! let mut loader = FrameBatchLoader::new(Arc::new(source));
//! loader.observe(|result: BatchResult| {
//!     if let Ok(batch) = result {
//!         println!("{} new frames from {}", batch.len(), batch.range);
//!     }
//! });
//!
//! // In a UI, call `poll()` once per frame of the event loop and
//! // `request_next()` when the user scrolls near the last frame.
//! loop {
//!     loader.poll();
//!     if !loader.is_loading() {
//!         if loader.is_end() {
//!             break;
//!         }
//!         loader.request_next();
//!     }
//!     std::thread::sleep(Duration::from_millis(16));
//! }
//! # Ok::<(), framepager::FramePagerError>(())
//! ```
//!
//! ## Behaviour
//!
//! - **Single flight**: requests made while a load is running are no-ops.
//! - **Best-effort batches**: a frame that fails to decode is left out and
//!   its second is listed in [`FrameBatch::skipped`]; only a failure of the
//!   source as a whole turns into a [`BatchFailure`].
//! - **Interactive-side delivery**: state changes and observer calls only
//!   happen inside [`FrameBatchLoader::poll`] and
//!   [`FrameBatchLoader::wait_timeout`], on the thread that owns the loader.
//! - **Cancellation**: [`FrameBatchLoader::cancel`] stops the running load
//!   and guarantees its result is never published.
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ffmpeg` | [`FfmpegFrameSource`] and FFmpeg log control (default) |
//! | `rayon` | `Executor::Rayon`: decode a batch's frames in parallel |
//! | `async` | `Executor::Tokio`: run loads on a tokio blocking pool |
//! | `full` | Enables all of the above |

pub mod batch;
pub mod config;
pub mod error;
pub mod executor;
pub mod extract;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
pub mod loader;
pub mod progress;
#[cfg(feature = "rayon")]
mod rayon;
pub mod source;
pub mod state;
#[cfg(feature = "ffmpeg")]
mod utilities;
#[cfg(feature = "ffmpeg")]
pub mod video;

pub use batch::{
    BatchFailure, BatchObserver, BatchResult, FrameBatch, LoadDirection, SampleRange,
    WeakObserver,
};
pub use config::{DEFAULT_MAX_DIMENSION, FrameOutputOptions, LoaderOptions, PixelFormat};
pub use error::FramePagerError;
pub use executor::Executor;
pub use extract::{ExtractedFrames, extract_range};
#[cfg(feature = "ffmpeg")]
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use loader::FrameBatchLoader;
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo, ProgressTracker};
pub use source::FrameSource;
pub use state::{
    DEFAULT_BATCH_SECONDS, MAX_BATCH_SECONDS, MIN_CURSOR_SECONDS, PaginationAction, PaginationState,
    reduce,
};
#[cfg(feature = "ffmpeg")]
pub use video::FfmpegFrameSource;
