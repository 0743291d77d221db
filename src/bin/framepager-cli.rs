use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
    sync::Arc,
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framepager::{
    BatchResult, DEFAULT_BATCH_SECONDS, FfmpegFrameSource, FfmpegLogLevel, FrameBatch,
    FrameBatchLoader, FrameOutputOptions, FrameSource, LoadDirection, LoaderOptions, PixelFormat,
    ProgressCallback, ProgressInfo,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Value, json};

const CLI_AFTER_HELP: &str = "Examples:
  framepager info input.mp4 --json
  framepager page input.mp4 --out frames --pages 3 --progress
  framepager page input.mp4 --out frames --batch-seconds 24 --back
  framepager completions zsh > _framepager";

#[derive(Debug, Parser)]
#[command(
    name = "framepager",
    version,
    about = "Page through frames sampled from a video, one batch at a time",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<String>,

    /// Frame pixel format (rgb8, rgba8, gray8).
    #[arg(long)]
    pixel_format: Option<String>,

    /// Bound the frame width in pixels.
    #[arg(long)]
    max_width: Option<u32>,

    /// Bound the frame height in pixels.
    #[arg(long)]
    max_height: Option<u32>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print what the pager knows about a video.
    #[command(
        about = "Print video duration, size, and page count",
        visible_alias = "probe",
        after_help = "Examples:\n  framepager info input.mp4\n  \
                      framepager info input.mp4 --batch-seconds 24 --json"
    )]
    Info {
        /// Input video path.
        input: PathBuf,
        /// Seconds per page, used for the page count.
        #[arg(long, default_value_t = DEFAULT_BATCH_SECONDS)]
        batch_seconds: f64,
        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Load pages of frames the way a scrolling view would and save them.
    #[command(
        about = "Page through frames and save each batch",
        after_help = "Examples:\n  framepager page input.mp4 --out frames\n  \
                      framepager page input.mp4 --out frames --pages 2 --ext jpg --json"
    )]
    Page {
        /// Input video path.
        input: PathBuf,
        /// Output directory for frame images.
        #[arg(long)]
        out: PathBuf,
        /// Seconds per page.
        #[arg(long, default_value_t = DEFAULT_BATCH_SECONDS)]
        batch_seconds: f64,
        /// Stop after this many forward pages (default: until the end).
        #[arg(long)]
        pages: Option<usize>,
        /// Finish with one step back.
        #[arg(long)]
        back: bool,
        /// Output image extension (png, jpg, jpeg, bmp, tiff).
        #[arg(long, default_value = "png")]
        ext: String,
        /// Give up on a page after this many seconds.
        #[arg(long, default_value_t = 300)]
        timeout: u64,
        /// Show a progress bar while each page decodes.
        #[arg(long)]
        progress: bool,
        /// Print a JSON summary instead of one line per page.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

/// What happened to one page, as reported by the observer.
#[derive(Debug)]
struct PageReport {
    index: usize,
    direction: LoadDirection,
    start: u64,
    end: u64,
    frames: usize,
    skipped: Vec<f64>,
    is_end: bool,
    failure: Option<String>,
}

impl PageReport {
    fn to_json(&self) -> Value {
        json!({
            "index": self.index,
            "direction": format!("{:?}", self.direction).to_lowercase(),
            "start_seconds": self.start,
            "end_seconds": self.end,
            "frames": self.frames,
            "skipped_seconds": self.skipped,
            "is_end": self.is_end,
            "failure": self.failure,
        })
    }

    fn print_line(&self) {
        let label = format!("page {}", self.index + 1);
        match &self.failure {
            Some(failure) => eprintln!("{} {}", label.red().bold(), failure.red()),
            None => {
                let mut line = format!(
                    "{} [{}s, {}s] {} frames",
                    label.green().bold(),
                    self.start,
                    self.end,
                    self.frames
                );
                if !self.skipped.is_empty() {
                    let skipped = format!(", {} skipped", self.skipped.len());
                    line.push_str(&skipped.yellow().to_string());
                }
                if self.direction == LoadDirection::Backward {
                    line.push_str(&" (back)".cyan().to_string());
                }
                if self.is_end {
                    line.push_str(&" end".bold().to_string());
                }
                println!("{line}");
            }
        }
    }
}

fn parse_pixel_format(value: &str) -> Option<PixelFormat> {
    match value.to_ascii_lowercase().as_str() {
        "rgb8" | "rgb" => Some(PixelFormat::Rgb8),
        "rgba8" | "rgba" => Some(PixelFormat::Rgba8),
        "gray8" | "gray" | "greyscale" | "grayscale" => Some(PixelFormat::Gray8),
        _ => None,
    }
}

fn parse_image_extension(value: &str) -> Option<&'static str> {
    match value.to_ascii_lowercase().trim_start_matches('.') {
        "png" => Some("png"),
        "jpg" | "jpeg" => Some("jpg"),
        "bmp" => Some("bmp"),
        "tif" | "tiff" => Some("tiff"),
        _ => None,
    }
}

fn frame_file_name(seconds: f64, extension: &str) -> String {
    format!("{:06}.{extension}", seconds as u64)
}

fn page_count(duration_seconds: f64, batch_seconds: f64) -> u64 {
    if batch_seconds <= 0.0 {
        return 0;
    }
    (duration_seconds / batch_seconds).ceil().max(1.0) as u64
}

fn build_output_options(
    global: &GlobalOptions,
) -> Result<FrameOutputOptions, Box<dyn std::error::Error>> {
    let mut options = FrameOutputOptions::new();

    if let Some(pixel_str) = &global.pixel_format {
        let pixel = parse_pixel_format(pixel_str)
            .ok_or(format!("unsupported --pixel-format: {pixel_str}"))?;
        options = options.with_pixel_format(pixel);
    }

    if global.max_width.is_some() || global.max_height.is_some() {
        options = options.with_max_dimensions(global.max_width, global.max_height);
    }

    Ok(options)
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        framepager::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        let template = "{spinner} {bar:32} {pos}/{len} frames {msg}";
        if let Ok(style) = ProgressStyle::with_template(template) {
            bar.set_style(style);
        }
        Self { bar }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_length(info.total);
        self.bar.set_position(info.current);
        if let Some(seconds) = info.current_seconds {
            self.bar.set_message(format!("@ {seconds:.0}s"));
        }
        if info.current >= info.total {
            self.bar.finish_and_clear();
            self.bar.reset();
        }
    }
}

fn save_batch(batch: &FrameBatch, out: &Path, extension: &str) -> Result<(), String> {
    for (image, seconds) in batch.frames.iter().zip(batch.timestamps()) {
        let path = out.join(frame_file_name(seconds, extension));
        image
            .save(&path)
            .map_err(|error| format!("could not write {}: {error}", path.display()))?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_page(
    global: &GlobalOptions,
    input: &Path,
    out: &Path,
    batch_seconds: f64,
    pages: Option<usize>,
    back: bool,
    extension: &'static str,
    timeout: Duration,
    progress: bool,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(out)?;

    let source = FfmpegFrameSource::open_with_options(input, build_output_options(global)?)?;
    let mut options = LoaderOptions::new().with_batch_seconds(batch_seconds);
    if progress {
        options = options.with_progress(Arc::new(TerminalProgress::new()));
    }

    // The main thread is the interactive context: it owns the loader and
    // receives every batch through `wait_timeout`.
    let mut loader = FrameBatchLoader::with_options(Arc::new(source), options)?;

    let reports: Rc<RefCell<Vec<PageReport>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&reports);
    let frames_dir = out.to_path_buf();
    loader.observe(move |result: BatchResult| {
        let mut reports = sink.borrow_mut();
        let index = reports.len();
        let report = match result {
            Ok(batch) => PageReport {
                index,
                direction: batch.direction,
                start: batch.range.start,
                end: batch.range.end,
                frames: batch.len(),
                skipped: batch.skipped.clone(),
                is_end: batch.is_end,
                failure: save_batch(&batch, &frames_dir, extension).err(),
            },
            Err(failure) => PageReport {
                index,
                direction: failure.direction,
                start: failure.range.start,
                end: failure.range.end,
                frames: 0,
                skipped: Vec::new(),
                is_end: false,
                failure: Some(failure.description),
            },
        };
        if !json_output {
            report.print_line();
        }
        reports.push(report);
    });

    let mut forward_pages = 0;
    loop {
        if !loader.wait_timeout(timeout) {
            return Err(format!("page did not finish within {}s", timeout.as_secs()).into());
        }
        forward_pages += 1;

        let failed = reports
            .borrow()
            .last()
            .is_some_and(|report| report.failure.is_some());
        let limit_reached = pages.is_some_and(|limit| forward_pages >= limit);
        if failed || loader.is_end() || limit_reached {
            break;
        }
        loader.request_next();
    }

    if back && loader.request_previous() && !loader.wait_timeout(timeout) {
        return Err(format!("page did not finish within {}s", timeout.as_secs()).into());
    }

    if json_output {
        let state = loader.state();
        let payload = json!({
            "input": input.display().to_string(),
            "duration_seconds": loader.duration_seconds(),
            "batch_seconds": loader.batch_seconds(),
            "cursor_seconds": state.cursor,
            "is_end": state.is_end,
            "pages": reports.borrow().iter().map(PageReport::to_json).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    }

    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Info {
            input,
            batch_seconds,
            json,
        } => {
            let output = build_output_options(&cli.global)?;
            let source = FfmpegFrameSource::open_with_options(&input, output)?;
            let duration = source.duration_seconds();
            let (out_width, out_height) = source.output_dimensions();
            let pages = page_count(duration, batch_seconds);
            if json {
                let payload = json!({
                    "input": input.display().to_string(),
                    "duration_seconds": duration,
                    "width": source.width(),
                    "height": source.height(),
                    "fps": source.frames_per_second(),
                    "frame_width": out_width,
                    "frame_height": out_height,
                    "batch_seconds": batch_seconds,
                    "pages": pages,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Duration: {duration:.3}s");
                println!(
                    "Video: {}x{} @ {:.3} fps",
                    source.width(),
                    source.height(),
                    source.frames_per_second()
                );
                println!("Frames: {out_width}x{out_height}");
                println!("Pages: {pages} of {batch_seconds}s");
            }
        }
        Commands::Page {
            input,
            out,
            batch_seconds,
            pages,
            back,
            ext,
            timeout,
            progress,
            json,
        } => {
            let extension = parse_image_extension(&ext)
                .ok_or(format!("unsupported --ext: {ext}"))?;
            run_page(
                &cli.global,
                &input,
                &out,
                batch_seconds,
                pages,
                back,
                extension,
                Duration::from_secs(timeout),
                progress,
                json,
            )?;
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framepager", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
