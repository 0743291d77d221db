//! The frame batch loader.
//!
//! [`FrameBatchLoader`] pages through a video one batch at a time. It is
//! owned by the interactive thread: every state transition and every
//! observer call happens on whichever thread holds the loader, while the
//! decoding of a batch runs on the configured [`Executor`](crate::Executor).
//! The two sides meet only at a channel of completions, which the owner
//! drains with [`poll`](FrameBatchLoader::poll) (from its event loop) or
//! [`wait_timeout`](FrameBatchLoader::wait_timeout) (when it has none).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use framepager::{FfmpegFrameSource, FrameBatchLoader};
//!
//! let source = FfmpegFrameSource::open("input.mp4")?;
//! // Construction already starts loading the first batch.
//! let mut loader = FrameBatchLoader::new(Arc::new(source));
//! loader.observe(|result: framepager::BatchResult| match result {
//!     Ok(batch) => println!("{} frames, end = {}", batch.len(), batch.is_end),
//!     Err(failure) => eprintln!("{failure}"),
//! });
//!
//! while loader.wait_timeout(Duration::from_secs(30)) && !loader.is_end() {
//!     loader.request_next();
//! }
//! # Ok::<(), framepager::FramePagerError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

use crate::batch::{
    BatchFailure, BatchObserver, BatchResult, FrameBatch, LoadDirection, SampleRange,
};
use crate::config::LoaderOptions;
use crate::error::FramePagerError;
use crate::executor::Job;
use crate::extract::{ExtractedFrames, extract_guarded};
use crate::progress::{CancellationToken, ProgressTracker};
use crate::source::FrameSource;
use crate::state::{MAX_BATCH_SECONDS, PaginationAction, PaginationState, reduce};

/// What a background job sends back.
struct Completion {
    generation: u64,
    result: Result<ExtractedFrames, FramePagerError>,
}

/// The job's end of the completion channel.
///
/// Exactly one completion is sent per job: the extraction result, or
/// [`FramePagerError::JobDropped`] if the executor discards the job before
/// it produces one.
struct CompletionSender {
    generation: u64,
    sender: Option<Sender<Completion>>,
}

impl CompletionSender {
    fn new(generation: u64, sender: Sender<Completion>) -> Self {
        Self {
            generation,
            sender: Some(sender),
        }
    }

    fn send(mut self, result: Result<ExtractedFrames, FramePagerError>) {
        self.deliver(result);
    }

    fn deliver(&mut self, result: Result<ExtractedFrames, FramePagerError>) {
        if let Some(sender) = self.sender.take() {
            // A send error only means the loader is gone.
            let _ = sender.send(Completion {
                generation: self.generation,
                result,
            });
        }
    }
}

impl Drop for CompletionSender {
    fn drop(&mut self) {
        if self.sender.is_some() {
            log::debug!("load job {} dropped before it completed", self.generation);
            self.deliver(Err(FramePagerError::JobDropped));
        }
    }
}

/// Bookkeeping for the single load in flight.
struct InFlight {
    generation: u64,
    range: SampleRange,
    direction: LoadDirection,
    cancellation: CancellationToken,
    /// State before the load started, restored by [`FrameBatchLoader::cancel`].
    previous: PaginationState,
}

/// Lazily loads batches of frames from a [`FrameSource`].
///
/// At most one load is ever in flight. Requests made while one is running
/// are silent no-ops, so batches reach the observer in request order.
pub struct FrameBatchLoader {
    source: Arc<dyn FrameSource>,
    duration: f64,
    options: LoaderOptions,
    state: PaginationState,
    generation: u64,
    in_flight: Option<InFlight>,
    observer: Option<Box<dyn BatchObserver>>,
    completion_sender: Sender<Completion>,
    completion_receiver: Receiver<Completion>,
}

impl Debug for FrameBatchLoader {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FrameBatchLoader")
            .field("duration", &self.duration)
            .field("options", &self.options)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("has_observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl FrameBatchLoader {
    /// Create a loader with default options and start loading the first
    /// batch.
    ///
    /// The duration is read from `source` once, here.
    pub fn new(source: Arc<dyn FrameSource>) -> Self {
        Self::build(source, LoaderOptions::new())
    }

    /// Create a loader with custom options and start loading the first
    /// batch.
    ///
    /// # Errors
    ///
    /// Returns [`FramePagerError::InvalidBatchSize`] if the configured batch
    /// size is not between one second and
    /// [`MAX_BATCH_SECONDS`](crate::MAX_BATCH_SECONDS).
    pub fn with_options(
        source: Arc<dyn FrameSource>,
        options: LoaderOptions,
    ) -> Result<Self, FramePagerError> {
        let batch_seconds = options.batch_seconds;
        if !(1.0..=MAX_BATCH_SECONDS).contains(&batch_seconds) {
            return Err(FramePagerError::InvalidBatchSize(batch_seconds));
        }
        Ok(Self::build(source, options))
    }

    fn build(source: Arc<dyn FrameSource>, options: LoaderOptions) -> Self {
        let duration = source.duration_seconds();
        let duration = if duration.is_nan() { 0.0 } else { duration.max(0.0) };
        let (completion_sender, completion_receiver) = unbounded();

        log::debug!(
            "frame loader created: duration {duration:.3}s, batch {}s",
            options.batch_seconds
        );

        let mut loader = Self {
            source,
            duration,
            options,
            state: PaginationState::default(),
            generation: 0,
            in_flight: None,
            observer: None,
            completion_sender,
            completion_receiver,
        };
        loader.request_next();
        loader
    }

    /// Register the observer, replacing any previous one.
    ///
    /// Results that complete before an observer is registered are held in
    /// the completion channel until the next [`poll`](Self::poll), so the
    /// first batch started by the constructor is not lost.
    pub fn observe(&mut self, observer: impl BatchObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Start loading the next batch.
    ///
    /// Returns `false` without doing anything if a load is already in
    /// flight. Otherwise the cursor advances by the batch size, the range
    /// `[previous cursor, new cursor]` is queued for background decoding,
    /// and the call returns immediately.
    pub fn request_next(&mut self) -> bool {
        self.start_load(PaginationAction::AdvanceRequested)
    }

    /// Start loading the previous batch.
    ///
    /// The cursor moves back by the batch size (never below one second) and
    /// the seconds it moved back over are reloaded. A no-op returning
    /// `false` while a load is in flight.
    pub fn request_previous(&mut self) -> bool {
        self.start_load(PaginationAction::RetreatRequested)
    }

    fn start_load(&mut self, action: PaginationAction) -> bool {
        if self.state.in_progress {
            log::debug!("{action:?} ignored: load already in flight");
            return false;
        }

        let previous = self.state;
        let next = reduce(previous, action, self.options.batch_seconds, self.duration);

        let (range, direction) = match action {
            PaginationAction::AdvanceRequested => (
                SampleRange::between(previous.cursor, next.cursor),
                LoadDirection::Forward,
            ),
            PaginationAction::RetreatRequested => (
                SampleRange::between(next.cursor, previous.cursor),
                LoadDirection::Backward,
            ),
            PaginationAction::LoadCompleted => return false,
        };

        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        let cancellation = CancellationToken::new();

        log::debug!(
            "loading {range} ({direction:?}, generation {generation}): cursor {:.3}s -> {:.3}s",
            previous.cursor,
            next.cursor
        );

        let job = self.load_job(generation, range, cancellation.clone());
        if let Err(error) = self.options.executor.spawn(job) {
            // The rejected job was dropped, so its completion sender has
            // already reported the load as failed.
            log::warn!("could not dispatch load of {range}: {error}");
        }

        self.state = next;
        self.in_flight = Some(InFlight {
            generation,
            range,
            direction,
            cancellation,
            previous,
        });
        true
    }

    fn load_job(
        &self,
        generation: u64,
        range: SampleRange,
        cancellation: CancellationToken,
    ) -> Job {
        let source = Arc::clone(&self.source);
        let completion = CompletionSender::new(generation, self.completion_sender.clone());
        let progress = Arc::clone(&self.options.progress);
        let interval = self.options.progress_interval;
        let parallel = self.options.executor.decodes_in_parallel();

        Box::new(move || {
            let mut tracker = ProgressTracker::new(progress, range.len(), interval);
            let result =
                extract_guarded(source.as_ref(), range, &mut tracker, &cancellation, parallel);
            completion.send(result);
        })
    }

    /// Deliver every finished load without blocking.
    ///
    /// Call this from the interactive thread, typically once per event-loop
    /// iteration. Returns how many results were published to the observer.
    pub fn poll(&mut self) -> usize {
        let mut published = 0;
        while let Ok(completion) = self.completion_receiver.try_recv() {
            if self.complete(completion) {
                published += 1;
            }
        }
        published
    }

    /// Block until the in-flight load finishes and deliver it.
    ///
    /// Returns `true` once nothing is in flight any more (immediately, if
    /// nothing was), `false` if `timeout` elapsed first. A timeout too large
    /// to represent as a deadline, such as [`Duration::MAX`], waits without
    /// limit.
    pub fn wait_timeout(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        while self.in_flight.is_some() {
            let received = match deadline {
                Some(deadline) => self.completion_receiver.recv_deadline(deadline),
                None => self
                    .completion_receiver
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(completion) => {
                    self.complete(completion);
                }
                Err(RecvTimeoutError::Timeout) => return false,
                // Unreachable while the loader holds its own sender.
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
        true
    }

    /// Apply a completion if it belongs to the current load. Returns whether
    /// anything was published.
    fn complete(&mut self, completion: Completion) -> bool {
        let in_flight = match self.in_flight.take() {
            Some(in_flight) if in_flight.generation == completion.generation => in_flight,
            other => {
                log::debug!(
                    "dropping stale completion (generation {})",
                    completion.generation
                );
                self.in_flight = other;
                return false;
            }
        };

        self.state = reduce(
            self.state,
            PaginationAction::LoadCompleted,
            self.options.batch_seconds,
            self.duration,
        );

        let InFlight {
            range, direction, ..
        } = in_flight;

        let result: BatchResult = match completion.result {
            Ok(extracted) => {
                log::debug!(
                    "loaded {range}: {} frames, {} skipped, end = {}",
                    extracted.frames.len(),
                    extracted.skipped.len(),
                    self.state.is_end
                );
                Ok(FrameBatch {
                    frames: extracted.frames,
                    is_end: self.state.is_end,
                    range,
                    direction,
                    skipped: extracted.skipped,
                })
            }
            Err(error) => {
                log::warn!("loading {range} failed: {error}");
                Err(BatchFailure {
                    description: error.to_string(),
                    range,
                    direction,
                })
            }
        };

        match self.observer.as_mut() {
            Some(observer) => observer.on_batch(result),
            None => log::debug!("no observer registered, discarding result for {range}"),
        }
        true
    }

    /// Abandon the in-flight load.
    ///
    /// The background job is asked to stop at its next frame, its result
    /// will be discarded if it still arrives, and the state returns to what
    /// it was before the load started, so the same range can be requested
    /// again. Nothing is published. Returns `false` if nothing was in
    /// flight.
    pub fn cancel(&mut self) -> bool {
        let Some(in_flight) = self.in_flight.take() else {
            return false;
        };

        in_flight.cancellation.cancel();
        self.generation = self.generation.wrapping_add(1);
        self.state = PaginationState {
            in_progress: false,
            ..in_flight.previous
        };

        log::debug!(
            "cancelled load of {} (generation {})",
            in_flight.range,
            in_flight.generation
        );
        true
    }

    /// Current pagination state.
    pub fn state(&self) -> PaginationState {
        self.state
    }

    /// Video duration read at construction, in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.duration
    }

    /// Seconds each load moves the cursor.
    pub fn batch_seconds(&self) -> f64 {
        self.options.batch_seconds
    }

    /// Returns `true` while a load is in flight.
    pub fn is_loading(&self) -> bool {
        self.state.in_progress
    }

    /// Returns `true` once the cursor has reached the end of the video.
    pub fn is_end(&self) -> bool {
        self.state.is_end
    }

    /// Identifier of the most recently started load.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for FrameBatchLoader {
    fn drop(&mut self) {
        if let Some(in_flight) = &self.in_flight {
            in_flight.cancellation.cancel();
        }
    }
}
