//! Shared test doubles.
//!
//! [`ScriptedSource`] stands in for a video: every frame is a 1×1 gray
//! image whose luma is the sampled second (mod 256), so tests can tell which
//! second each delivered frame came from.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use framepager::{BatchResult, FramePagerError, FrameSource};
use image::{DynamicImage, GrayImage, Luma};

/// A frame source whose behaviour per second is set up by the test.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    duration: f64,
    failing: HashSet<u64>,
    fatal_at: Option<u64>,
    panic_at: Option<u64>,
    gate: Option<Arc<Gate>>,
    decoded: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    /// Frame-local decode failure at each of `seconds`.
    pub fn failing_at(mut self, seconds: &[u64]) -> Self {
        self.failing.extend(seconds.iter().copied());
        self
    }

    /// Batch-level failure once `second` is reached.
    pub fn unavailable_at(mut self, second: u64) -> Self {
        self.fatal_at = Some(second);
        self
    }

    /// Panic while decoding `second`.
    pub fn panicking_at(mut self, second: u64) -> Self {
        self.panic_at = Some(second);
        self
    }

    /// Block every decode until `gate` is opened.
    pub fn gated(mut self, gate: Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// How many decodes were attempted so far.
    pub fn decoded(&self) -> usize {
        self.decoded.load(Ordering::SeqCst)
    }
}

impl FrameSource for ScriptedSource {
    fn duration_seconds(&self) -> f64 {
        self.duration
    }

    fn decode_frame(&self, at_seconds: f64) -> Result<DynamicImage, FramePagerError> {
        if let Some(gate) = &self.gate {
            gate.wait();
        }
        self.decoded.fetch_add(1, Ordering::SeqCst);

        let second = at_seconds as u64;
        if self.panic_at == Some(second) {
            panic!("decoder exploded at {second}s");
        }
        if self.fatal_at == Some(second) {
            return Err(FramePagerError::SourceUnavailable(
                "file went away".to_string(),
            ));
        }
        if self.failing.contains(&second) {
            return Err(FramePagerError::FrameDecode {
                seconds: at_seconds,
                reason: "corrupt packet".to_string(),
            });
        }
        if at_seconds > self.duration {
            return Err(FramePagerError::InvalidTimestamp(at_seconds));
        }
        Ok(frame_for(second))
    }
}

/// The frame [`ScriptedSource`] produces for `second`.
pub fn frame_for(second: u64) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(1, 1, Luma([(second % 256) as u8])))
}

/// The second a [`ScriptedSource`] frame was sampled at (mod 256).
pub fn second_of(frame: &DynamicImage) -> u64 {
    u64::from(frame.to_luma8().get_pixel(0, 0).0[0])
}

/// A latch that holds decodes until the test releases them.
#[derive(Debug, Default)]
pub struct Gate {
    open: Mutex<bool>,
    changed: Condvar,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open(&self) {
        let mut open = self.open.lock().unwrap();
        *open = true;
        self.changed.notify_all();
    }

    fn wait(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.changed.wait(open).unwrap();
        }
    }
}

/// Shared record of everything an observer received.
pub type Recorded = Arc<Mutex<Vec<BatchResult>>>;

/// An observer closure that appends to the returned record.
pub fn recorder() -> (Recorded, impl FnMut(BatchResult) + 'static) {
    let record: Recorded = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&record);
    (record, move |result| sink.lock().unwrap().push(result))
}
