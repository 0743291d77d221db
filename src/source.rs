//! The frame source capability.
//!
//! The loader does not know how frames are decoded. It only needs a
//! [`FrameSource`]: something that knows the video duration and can produce
//! one image for a point in time. [`FfmpegFrameSource`](crate::FfmpegFrameSource)
//! is the bundled implementation (feature `ffmpeg`).

use std::sync::Arc;

use image::DynamicImage;

use crate::error::FramePagerError;

/// A read-only provider of decoded frames.
///
/// Sources are shared with the background context through an
/// [`Arc`], so they must be [`Send`] and [`Sync`]; any decoder state that
/// needs mutation belongs behind a lock inside the implementation.
///
/// # Example
///
/// ```
/// use framepager::{FramePagerError, FrameSource};
/// use image::{DynamicImage, Rgb, RgbImage};
///
/// struct Gradient {
///     seconds: f64,
/// }
///
/// impl FrameSource for Gradient {
///     fn duration_seconds(&self) -> f64 {
///         self.seconds
///     }
///
///     fn decode_frame(&self, at_seconds: f64) -> Result<DynamicImage, FramePagerError> {
///         if at_seconds > self.seconds {
///             return Err(FramePagerError::InvalidTimestamp(at_seconds));
///         }
///         let shade = (at_seconds / self.seconds * 255.0) as u8;
///         Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([shade; 3]))))
///     }
/// }
/// ```
pub trait FrameSource: Send + Sync {
    /// Total length of the video in seconds.
    fn duration_seconds(&self) -> f64;

    /// Decode the frame shown at `at_seconds`.
    ///
    /// Return a frame-local error (see
    /// [`FramePagerError::is_frame_local`]) when only this position failed;
    /// any other error fails the whole batch.
    fn decode_frame(&self, at_seconds: f64) -> Result<DynamicImage, FramePagerError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Arc<S> {
    fn duration_seconds(&self) -> f64 {
        (**self).duration_seconds()
    }

    fn decode_frame(&self, at_seconds: f64) -> Result<DynamicImage, FramePagerError> {
        (**self).decode_frame(at_seconds)
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn duration_seconds(&self) -> f64 {
        (**self).duration_seconds()
    }

    fn decode_frame(&self, at_seconds: f64) -> Result<DynamicImage, FramePagerError> {
        (**self).decode_frame(at_seconds)
    }
}
