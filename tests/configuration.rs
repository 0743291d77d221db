//! LoaderOptions, FrameOutputOptions, and Executor tests.

use std::sync::Arc;

use framepager::{
    DEFAULT_MAX_DIMENSION, Executor, FrameOutputOptions, LoaderOptions, PixelFormat,
    ProgressCallback, ProgressInfo,
};

// ── LoaderOptions builder ──────────────────────────────────────────

#[test]
fn loader_options_defaults() {
    let options = LoaderOptions::new();
    assert_eq!(options.batch_seconds(), 48.0);

    let debug = format!("{options:?}");
    assert!(debug.contains("LoaderOptions"));
    assert!(debug.contains("Thread"));
    assert!(debug.contains("progress_interval: 1"));
}

#[test]
fn loader_options_default_matches_new() {
    let debug_new = format!("{:?}", LoaderOptions::new());
    let debug_default = format!("{:?}", LoaderOptions::default());
    assert_eq!(debug_new, debug_default);
}

#[test]
fn loader_options_with_batch_seconds() {
    let options = LoaderOptions::new().with_batch_seconds(24.0);
    assert_eq!(options.batch_seconds(), 24.0);
}

#[test]
fn loader_options_progress_interval_clamps_zero() {
    let options = LoaderOptions::new().with_progress_interval(0);
    let debug = format!("{options:?}");
    // Clamped to 1.
    assert!(debug.contains("progress_interval: 1"));
}

#[test]
fn loader_options_with_progress_callback() {
    struct Quiet;
    impl ProgressCallback for Quiet {
        fn on_progress(&self, _info: &ProgressInfo) {}
    }

    let options = LoaderOptions::new()
        .with_progress(Arc::new(Quiet))
        .with_progress_interval(10);
    let debug = format!("{options:?}");
    assert!(debug.contains("progress_interval: 10"));
}

#[test]
fn executor_defaults_to_thread() {
    assert!(matches!(Executor::default(), Executor::Thread));
}

#[cfg(feature = "rayon")]
#[test]
fn loader_options_with_rayon_executor() {
    let options = LoaderOptions::new().with_executor(Executor::Rayon);
    assert!(format!("{options:?}").contains("Rayon"));
}

// ── FrameOutputOptions ─────────────────────────────────────────────

#[test]
fn frame_output_defaults() {
    let output = FrameOutputOptions::default();
    assert_eq!(output.pixel_format, PixelFormat::Rgb8);
    assert_eq!(output.max_width, Some(DEFAULT_MAX_DIMENSION));
    assert_eq!(output.max_height, Some(200));
}

#[test]
fn frame_output_builders() {
    let output = FrameOutputOptions::new()
        .with_pixel_format(PixelFormat::Gray8)
        .with_max_dimensions(Some(320), None);
    assert_eq!(output.pixel_format, PixelFormat::Gray8);
    assert_eq!(output.max_width, Some(320));
    assert_eq!(output.max_height, None);
}

#[test]
fn resolve_fits_landscape_into_box() {
    let output = FrameOutputOptions::new();
    assert_eq!(output.resolve_dimensions(1920, 1080), (200, 113));
}

#[test]
fn resolve_fits_portrait_into_box() {
    let output = FrameOutputOptions::new();
    assert_eq!(output.resolve_dimensions(1080, 1920), (113, 200));
}

#[test]
fn resolve_never_upscales() {
    let output = FrameOutputOptions::new();
    assert_eq!(output.resolve_dimensions(160, 90), (160, 90));
}

#[test]
fn resolve_with_single_bound() {
    let output = FrameOutputOptions::new().with_max_dimensions(Some(640), None);
    assert_eq!(output.resolve_dimensions(1280, 720), (640, 360));

    let output = FrameOutputOptions::new().with_max_dimensions(None, Some(100));
    assert_eq!(output.resolve_dimensions(1280, 720), (178, 100));
}

#[test]
fn resolve_unbounded_keeps_source_size() {
    let output = FrameOutputOptions::new().with_max_dimensions(None, None);
    assert_eq!(output.resolve_dimensions(3840, 2160), (3840, 2160));
}

#[test]
fn resolve_is_at_least_one_pixel() {
    let output = FrameOutputOptions::new();
    assert_eq!(output.resolve_dimensions(10_000, 1), (200, 1));
    assert_eq!(output.resolve_dimensions(0, 0), (1, 1));
}
