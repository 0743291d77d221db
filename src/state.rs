//! Pagination state machine.
//!
//! [`reduce`] is a pure transition function over [`PaginationState`]. It owns
//! nothing and can be called from anywhere; the
//! [`FrameBatchLoader`](crate::FrameBatchLoader) is the only component that
//! keeps a live state and feeds it through here.
//!
//! # Example
//!
//! ```
//! use framepager::{PaginationAction, PaginationState, reduce};
//!
//! let idle = PaginationState::default();
//! let loading = reduce(idle, PaginationAction::AdvanceRequested, 48.0, 100.0);
//! assert_eq!(loading.cursor, 48.0);
//! assert!(loading.in_progress);
//!
//! // A second advance while loading changes nothing.
//! assert_eq!(reduce(loading, PaginationAction::AdvanceRequested, 48.0, 100.0), loading);
//!
//! let done = reduce(loading, PaginationAction::LoadCompleted, 48.0, 100.0);
//! assert!(!done.in_progress);
//! ```

/// Lowest cursor a retreat can land on, in seconds.
pub const MIN_CURSOR_SECONDS: f64 = 1.0;

/// Default batch size: 48 seconds of video, sampled once per second.
pub const DEFAULT_BATCH_SECONDS: f64 = 48.0;

/// Largest batch a loader accepts: one day of video per load.
pub const MAX_BATCH_SECONDS: f64 = 86_400.0;

/// Position and flags of the frame pager.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PaginationState {
    /// Time in seconds up to which frames have been requested.
    pub cursor: f64,
    /// The cursor has reached or passed the video duration.
    pub is_end: bool,
    /// A load has been started and its completion not yet applied.
    pub in_progress: bool,
}

impl PaginationState {
    /// State at a given cursor, not at the end and idle.
    pub fn at(cursor: f64) -> Self {
        Self {
            cursor,
            is_end: false,
            in_progress: false,
        }
    }
}

/// Transitions understood by [`reduce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaginationAction {
    /// Start loading the next batch: move the cursor forward.
    AdvanceRequested,
    /// Start loading the previous batch: move the cursor back.
    RetreatRequested,
    /// The in-flight batch has been delivered.
    LoadCompleted,
}

/// Apply `action` to `state`.
///
/// Advance and retreat are no-ops while `in_progress` is set; callers must
/// compare the result with the input before starting background work.
/// Both mark the state as in progress, and only
/// [`LoadCompleted`](PaginationAction::LoadCompleted) clears it again.
///
/// - Advance: `cursor + batch_size`, `is_end = cursor >= duration`.
/// - Retreat: `max(1.0, cursor - batch_size)`, `is_end = false`.
/// - Completed: cursor and end flag carried through.
pub fn reduce(
    state: PaginationState,
    action: PaginationAction,
    batch_size: f64,
    duration: f64,
) -> PaginationState {
    match action {
        PaginationAction::AdvanceRequested => {
            if state.in_progress {
                return state;
            }
            let cursor = state.cursor + batch_size;
            PaginationState {
                cursor,
                is_end: cursor >= duration,
                in_progress: true,
            }
        }
        PaginationAction::RetreatRequested => {
            if state.in_progress {
                return state;
            }
            PaginationState {
                cursor: (state.cursor - batch_size).max(MIN_CURSOR_SECONDS),
                is_end: false,
                in_progress: true,
            }
        }
        PaginationAction::LoadCompleted => PaginationState {
            in_progress: false,
            ..state
        },
    }
}
