//! Error handling integration tests.
//!
//! These tests verify error classification (frame-local versus
//! batch-level) and that messages carry useful context.

use std::io::{Error as IoError, ErrorKind};
use std::path::PathBuf;

use framepager::FramePagerError;

// ── Classification ─────────────────────────────────────────────────

#[test]
fn decode_problems_are_frame_local() {
    let frame_local = [
        FramePagerError::FrameDecode {
            seconds: 3.0,
            reason: "corrupt".to_string(),
        },
        FramePagerError::InvalidTimestamp(120.0),
    ];
    for error in &frame_local {
        assert!(error.is_frame_local(), "{error:?}");
    }
}

#[test]
fn source_problems_fail_the_batch() {
    let batch_level = [
        FramePagerError::SourceUnavailable("gone".to_string()),
        FramePagerError::NoVideoStream,
        FramePagerError::Cancelled,
        FramePagerError::WorkerPanicked("boom".to_string()),
        FramePagerError::JobDropped,
        FramePagerError::InvalidBatchSize(0.0),
        FramePagerError::IoError(IoError::new(ErrorKind::NotFound, "missing")),
        FramePagerError::SourceOpen {
            path: PathBuf::from("missing.mp4"),
            reason: "No such file".to_string(),
        },
    ];
    for error in &batch_level {
        assert!(!error.is_frame_local(), "{error:?}");
    }
}

#[cfg(feature = "ffmpeg")]
#[test]
fn ffmpeg_errors_convert_and_are_frame_local() {
    let error: FramePagerError = ffmpeg_next::Error::InvalidData.into();
    assert!(matches!(error, FramePagerError::FfmpegError(_)));
    assert!(error.is_frame_local());
}

// ── Messages ───────────────────────────────────────────────────────

#[test]
fn frame_decode_message_includes_position() {
    let error = FramePagerError::FrameDecode {
        seconds: 12.0,
        reason: "no frame".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains("12.000s"), "{message}");
    assert!(message.contains("no frame"), "{message}");
}

#[test]
fn source_open_message_includes_path() {
    let error = FramePagerError::SourceOpen {
        path: PathBuf::from("clips/missing.mp4"),
        reason: "No such file or directory".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains("Failed to open video source"), "{message}");
    assert!(message.contains("clips/missing.mp4"), "{message}");
}

#[test]
fn invalid_batch_size_message_includes_value() {
    let message = FramePagerError::InvalidBatchSize(0.5).to_string();
    assert!(message.contains("0.5"), "{message}");
}

#[test]
fn invalid_batch_size_message_states_bounds() {
    let message = FramePagerError::InvalidBatchSize(1e12).to_string();
    assert!(message.contains("between 1 and 86400"), "{message}");
}

#[test]
fn dropped_job_message_mentions_drop() {
    let message = FramePagerError::JobDropped.to_string();
    assert!(message.contains("dropped"), "{message}");
}

#[test]
fn io_errors_convert() {
    let error: FramePagerError = IoError::new(ErrorKind::PermissionDenied, "denied").into();
    assert!(error.to_string().starts_with("I/O error"));
}

// ── FFmpeg source ──────────────────────────────────────────────────

#[cfg(feature = "ffmpeg")]
#[test]
fn open_nonexistent_file() {
    let result = framepager::FfmpegFrameSource::open("this_file_does_not_exist.mp4");
    let error_message = result.unwrap_err().to_string();
    assert!(
        error_message.contains("Failed to open video source"),
        "Error message should mention file open failure: {error_message}",
    );
}

#[cfg(feature = "ffmpeg")]
#[test]
fn open_invalid_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a video file")
        .expect("Failed to write invalid file");

    let result = framepager::FfmpegFrameSource::open(&invalid_file_path);
    assert!(result.is_err(), "Expected error for invalid video file");
}
