//! Helpers shared by the FFmpeg source: pixel copying and time conversion.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy plane 0 of `video_frame` into a tightly packed buffer, dropping any
/// per-row padding FFmpeg added after `width * bytes_per_pixel` bytes.
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == row_bytes {
        data[..row_bytes * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
        }
        buffer
    }
}

/// Seconds to a container-level seek timestamp.
///
/// `Input::seek` with no stream selected works in AV_TIME_BASE
/// (microseconds), not in any stream's time base.
pub(crate) fn seconds_to_seek_timestamp(seconds: f64) -> i64 {
    (seconds * 1_000_000.0) as i64
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    if time_base.denominator() == 0 {
        return 0.0;
    }
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Presentation time of a stream's first frame, in seconds.
///
/// Unknown (`AV_NOPTS_VALUE`) and negative start times count as zero.
pub(crate) fn stream_start_seconds(start_time: i64, time_base: Rational) -> f64 {
    if start_time <= 0 {
        return 0.0;
    }
    pts_to_seconds(start_time, time_base)
}

/// A frame's PTS as seconds since the stream start.
pub(crate) fn presentation_seconds(pts: i64, time_base: Rational, start_seconds: f64) -> f64 {
    pts_to_seconds(pts, time_base) - start_seconds
}

/// A rational rate as a float, or `None` when it is unset.
pub(crate) fn rational_to_f64(rate: Rational) -> Option<f64> {
    (rate.numerator() > 0 && rate.denominator() > 0)
        .then(|| rate.numerator() as f64 / rate.denominator() as f64)
}
