//! FFmpeg-backed frame source.
//!
//! [`FfmpegFrameSource`] opens a video once, caches what the loader needs to
//! know about it, and decodes one still per request: seek to the keyframe at
//! or before the requested time, decode forward to the first frame that
//! reaches it, scale it into the configured bounding box. The decoder and
//! scaler are built once at open and flushed on every seek.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    sync::Mutex,
};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::context::Input,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use crate::config::{FrameOutputOptions, PixelFormat};
use crate::error::FramePagerError;
use crate::source::FrameSource;
use crate::utilities::{
    frame_to_buffer, presentation_seconds, pts_to_seconds, rational_to_f64,
    seconds_to_seek_timestamp, stream_start_seconds,
};

/// A [`FrameSource`] reading from a media file through FFmpeg.
///
/// The demuxer, decoder and scaler sit behind one mutex, so concurrent
/// decodes (as issued by the rayon executor) are serialised per source.
///
/// # Example
///
/// ```no_run
/// use framepager::{FfmpegFrameSource, FrameOutputOptions, FrameSource, PixelFormat};
///
/// let source = FfmpegFrameSource::open_with_options(
///     "input.mp4",
///     FrameOutputOptions::new()
///         .with_pixel_format(PixelFormat::Rgba8)
///         .with_max_dimensions(Some(320), None),
/// )?;
/// println!("{:.1}s of video", source.duration_seconds());
/// source.decode_frame(12.0)?.save("at_12s.png")?;
/// # Ok::<(), framepager::FramePagerError>(())
/// ```
pub struct FfmpegFrameSource {
    state: Mutex<DecodeState>,
    path: PathBuf,
    video_stream_index: usize,
    /// Presentation time of the stream's first frame; positions are relative
    /// to it.
    start_seconds: f64,
    duration_seconds: f64,
    frames_per_second: f64,
    width: u32,
    height: u32,
    output: FrameOutputOptions,
}

impl Debug for FfmpegFrameSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FfmpegFrameSource")
            .field("path", &self.path)
            .field("video_stream_index", &self.video_stream_index)
            .field("start_seconds", &self.start_seconds)
            .field("duration_seconds", &self.duration_seconds)
            .field("frames_per_second", &self.frames_per_second)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

/// Everything a decode mutates, reused across calls.
struct DecodeState {
    input: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    time_base: Rational,
    decoded: VideoFrame,
    scaled: VideoFrame,
}

impl FfmpegFrameSource {
    /// Open a video with the default output: RGB8 frames fitting 200×200.
    ///
    /// # Errors
    ///
    /// [`FramePagerError::SourceOpen`] if FFmpeg cannot open the file, or
    /// [`FramePagerError::NoVideoStream`] if it has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FramePagerError> {
        Self::open_with_options(path, FrameOutputOptions::new())
    }

    /// Open a video with custom frame output settings.
    ///
    /// # Errors
    ///
    /// Same as [`open`](FfmpegFrameSource::open).
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        output: FrameOutputOptions,
    ) -> Result<Self, FramePagerError> {
        let path = path.as_ref().to_path_buf();

        ffmpeg_next::init().map_err(|error| FramePagerError::SourceOpen {
            path: path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input = ffmpeg_next::format::input(&path).map_err(|error| {
            FramePagerError::SourceOpen {
                path: path.clone(),
                reason: error.to_string(),
            }
        })?;

        let (
            video_stream_index,
            time_base,
            start_seconds,
            stream_duration,
            frames_per_second,
            decoder,
        ) = {
            let stream = input
                .streams()
                .best(Type::Video)
                .ok_or(FramePagerError::NoVideoStream)?;
            let time_base = stream.time_base();

            let frames_per_second = rational_to_f64(stream.avg_frame_rate())
                .or_else(|| rational_to_f64(stream.rate()))
                .unwrap_or(0.0);

            let stream_duration = if stream.duration() > 0 {
                pts_to_seconds(stream.duration(), time_base)
            } else {
                0.0
            };

            let decoder = CodecContext::from_parameters(stream.parameters())?
                .decoder()
                .video()?;

            (
                stream.index(),
                time_base,
                stream_start_seconds(stream.start_time(), time_base),
                stream_duration,
                frames_per_second,
                decoder,
            )
        };

        let (width, height) = (decoder.width(), decoder.height());
        let (out_width, out_height) = output.resolve_dimensions(width, height);
        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            output.pixel_format.to_ffmpeg_pixel(),
            out_width,
            out_height,
            ScalingFlags::BILINEAR,
        )?;

        let container_duration = input.duration();
        let duration_seconds = if container_duration > 0 {
            container_duration as f64 / 1_000_000.0
        } else {
            stream_duration
        };

        log::debug!(
            "opened {}: {duration_seconds:.3}s from {start_seconds:.3}s, \
             {width}x{height} @ {frames_per_second:.3} fps",
            path.display()
        );

        Ok(Self {
            state: Mutex::new(DecodeState {
                input,
                decoder,
                scaler,
                time_base,
                decoded: VideoFrame::empty(),
                scaled: VideoFrame::empty(),
            }),
            path,
            video_stream_index,
            start_seconds,
            duration_seconds,
            frames_per_second,
            width,
            height,
            output,
        })
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Source frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Source frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Average frame rate, or 0.0 if the container does not say.
    pub fn frames_per_second(&self) -> f64 {
        self.frames_per_second
    }

    /// Dimensions of the frames this source produces.
    pub fn output_dimensions(&self) -> (u32, u32) {
        self.output.resolve_dimensions(self.width, self.height)
    }

    /// Half a frame interval: a decoded frame this close before the target
    /// is the frame on screen at the target.
    fn tolerance(&self) -> f64 {
        if self.frames_per_second > 0.0 {
            0.5 / self.frames_per_second
        } else {
            0.0
        }
    }

    fn decode_locked(
        &self,
        state: &mut DecodeState,
        at_seconds: f64,
    ) -> Result<DynamicImage, FramePagerError> {
        let DecodeState {
            input,
            decoder,
            scaler,
            time_base,
            decoded,
            scaled,
        } = state;
        let time_base = *time_base;

        let target = seconds_to_seek_timestamp(at_seconds + self.start_seconds);
        input.seek(target, ..target)?;
        // Drop frames buffered before the seek and leave any draining state.
        decoder.flush();

        let pixel_format = self.output.pixel_format;
        let (width, height) = self.output_dimensions();
        let threshold = at_seconds - self.tolerance();

        for (stream, packet) in input.packets() {
            if stream.index() != self.video_stream_index {
                continue;
            }
            decoder.send_packet(&packet)?;

            while decoder.receive_frame(decoded).is_ok() {
                if frame_seconds(decoded, time_base, self.start_seconds) >= threshold {
                    scaler.run(decoded, scaled)?;
                    return convert_frame(scaled, width, height, pixel_format, at_seconds);
                }
            }
        }

        decoder.send_eof()?;
        while decoder.receive_frame(decoded).is_ok() {
            if frame_seconds(decoded, time_base, self.start_seconds) >= threshold {
                scaler.run(decoded, scaled)?;
                return convert_frame(scaled, width, height, pixel_format, at_seconds);
            }
        }

        Err(FramePagerError::FrameDecode {
            seconds: at_seconds,
            reason: "no frame at or after this position".to_string(),
        })
    }
}

impl FrameSource for FfmpegFrameSource {
    fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    fn decode_frame(&self, at_seconds: f64) -> Result<DynamicImage, FramePagerError> {
        if !at_seconds.is_finite() || at_seconds < 0.0 || at_seconds > self.duration_seconds {
            return Err(FramePagerError::InvalidTimestamp(at_seconds));
        }

        let mut state = self.state.lock().map_err(|_| {
            FramePagerError::SourceUnavailable(format!(
                "demuxer for {} was poisoned by a panic",
                self.path.display()
            ))
        })?;

        self.decode_locked(&mut state, at_seconds)
    }
}

/// Position of a decoded frame relative to the stream start.
fn frame_seconds(frame: &VideoFrame, time_base: Rational, start_seconds: f64) -> f64 {
    let pts = frame.timestamp().or(frame.pts()).unwrap_or(0);
    presentation_seconds(pts, time_base, start_seconds)
}

fn convert_frame(
    scaled: &VideoFrame,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    at_seconds: f64,
) -> Result<DynamicImage, FramePagerError> {
    let buffer = frame_to_buffer(scaled, width, height, pixel_format.bytes_per_pixel());
    let image = match pixel_format {
        PixelFormat::Rgb8 => RgbImage::from_raw(width, height, buffer).map(DynamicImage::ImageRgb8),
        PixelFormat::Rgba8 => {
            RgbaImage::from_raw(width, height, buffer).map(DynamicImage::ImageRgba8)
        }
        PixelFormat::Gray8 => {
            GrayImage::from_raw(width, height, buffer).map(DynamicImage::ImageLuma8)
        }
    };
    image.ok_or_else(|| FramePagerError::FrameDecode {
        seconds: at_seconds,
        reason: format!("decoded buffer does not fit a {width}x{height} {pixel_format:?} image"),
    })
}
