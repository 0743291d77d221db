//! Benchmarks for the pagination reducer, batch extraction, and a full
//! loader round trip.
//!
//! Run with: cargo bench
//! Run with all features: cargo bench --all-features
//!
//! The FFmpeg benchmark requires `tests/fixtures/sample_video.mp4`.

use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use criterion::Criterion;
use framepager::{
    CancellationToken, Executor, FrameBatchLoader, FramePagerError, FrameSource, LoaderOptions,
    PaginationAction, PaginationState, ProgressTracker, SampleRange, extract_range, reduce,
};
use image::{DynamicImage, RgbImage};

/// A source that renders a flat 200×113 frame without touching any file.
struct SyntheticSource {
    duration: f64,
}

impl FrameSource for SyntheticSource {
    fn duration_seconds(&self) -> f64 {
        self.duration
    }

    fn decode_frame(&self, at_seconds: f64) -> Result<DynamicImage, FramePagerError> {
        if at_seconds > self.duration {
            return Err(FramePagerError::InvalidTimestamp(at_seconds));
        }
        let shade = (at_seconds as u64 % 256) as u8;
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            200,
            113,
            image::Rgb([shade, shade, shade]),
        )))
    }
}

fn benchmark_reducer(criterion: &mut Criterion) {
    criterion.bench_function("reduce: page through a 2h video", |bencher| {
        bencher.iter(|| {
            let mut state = PaginationState::default();
            while !state.is_end {
                state = reduce(state, PaginationAction::AdvanceRequested, 48.0, 7200.0);
                state = reduce(state, PaginationAction::LoadCompleted, 48.0, 7200.0);
            }
            black_box(state)
        });
    });

    criterion.bench_function("reduce: rejected request while loading", |bencher| {
        let busy = PaginationState {
            in_progress: true,
            ..PaginationState::at(48.0)
        };
        bencher.iter(|| {
            black_box(reduce(
                black_box(busy),
                PaginationAction::AdvanceRequested,
                48.0,
                100.0,
            ))
        });
    });
}

fn benchmark_extraction(criterion: &mut Criterion) {
    let source = SyntheticSource { duration: 7200.0 };

    criterion.bench_function("extract_range: 49 synthetic frames", |bencher| {
        bencher.iter(|| {
            let range = SampleRange::new(0, 48);
            let mut tracker = ProgressTracker::silent(range.len());
            black_box(extract_range(&source, range, &mut tracker, &CancellationToken::new()))
        });
    });

    let partial = SyntheticSource { duration: 20.0 };
    criterion.bench_function("extract_range: batch running past the end", |bencher| {
        bencher.iter(|| {
            let range = SampleRange::new(0, 48);
            let mut tracker = ProgressTracker::silent(range.len());
            black_box(extract_range(&partial, range, &mut tracker, &CancellationToken::new()))
        });
    });
}

fn benchmark_loader(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("loader round trip");
    group.measurement_time(Duration::from_secs(5));

    #[allow(unused_mut)]
    let mut executors = vec![("thread", Executor::Thread)];
    #[cfg(feature = "rayon")]
    executors.push(("rayon", Executor::Rayon));

    for (name, executor) in executors {
        group.bench_function(name, |bencher| {
            bencher.iter(|| {
                let mut loader = FrameBatchLoader::with_options(
                    Arc::new(SyntheticSource { duration: 7200.0 }),
                    LoaderOptions::new().with_executor(executor.clone()),
                )
                .unwrap();
                assert!(loader.wait_timeout(Duration::from_secs(30)));
                black_box(loader.state())
            });
        });
    }

    group.finish();
}

#[cfg(feature = "ffmpeg")]
fn benchmark_ffmpeg_source(criterion: &mut Criterion) {
    use framepager::{FfmpegFrameSource, FfmpegLogLevel};

    const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

    framepager::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !std::path::Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let source = FfmpegFrameSource::open(SAMPLE_VIDEO).unwrap();
    criterion.bench_function("ffmpeg: decode one frame (seek)", |bencher| {
        bencher.iter(|| black_box(source.decode_frame(1.0).unwrap()));
    });
}

#[cfg(not(feature = "ffmpeg"))]
fn benchmark_ffmpeg_source(_criterion: &mut Criterion) {}

criterion::criterion_group!(
    benches,
    benchmark_reducer,
    benchmark_extraction,
    benchmark_loader,
    benchmark_ffmpeg_source,
);

criterion::criterion_main!(benches);
