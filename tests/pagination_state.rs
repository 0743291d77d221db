//! Pagination state machine tests.

use framepager::{
    DEFAULT_BATCH_SECONDS, MIN_CURSOR_SECONDS, PaginationAction, PaginationState, reduce,
};

const BATCH: f64 = DEFAULT_BATCH_SECONDS;

fn idle(cursor: f64) -> PaginationState {
    PaginationState::at(cursor)
}

fn busy(cursor: f64) -> PaginationState {
    PaginationState {
        in_progress: true,
        ..PaginationState::at(cursor)
    }
}

// ── Advance ────────────────────────────────────────────────────────

#[test]
fn default_state_is_idle_at_zero() {
    let state = PaginationState::default();
    assert_eq!(state.cursor, 0.0);
    assert!(!state.is_end);
    assert!(!state.in_progress);
}

#[test]
fn advance_moves_cursor_by_batch_size() {
    let next = reduce(idle(0.0), PaginationAction::AdvanceRequested, BATCH, 100.0);
    assert_eq!(next.cursor, 48.0);
    assert!(!next.is_end);
    assert!(next.in_progress);
}

#[test]
fn advance_reaching_duration_sets_end() {
    let next = reduce(idle(48.0), PaginationAction::AdvanceRequested, BATCH, 96.0);
    assert_eq!(next.cursor, 96.0);
    assert!(next.is_end, "cursor equal to duration is the end");
}

#[test]
fn advance_past_duration_sets_end() {
    let next = reduce(idle(96.0), PaginationAction::AdvanceRequested, BATCH, 100.0);
    assert_eq!(next.cursor, 144.0);
    assert!(next.is_end);
}

#[test]
fn advance_on_zero_duration_ends_immediately() {
    let next = reduce(idle(0.0), PaginationAction::AdvanceRequested, BATCH, 0.0);
    assert!(next.is_end);
}

#[test]
fn advance_after_end_keeps_going() {
    let mut state = reduce(idle(0.0), PaginationAction::AdvanceRequested, BATCH, 10.0);
    state = reduce(state, PaginationAction::LoadCompleted, BATCH, 10.0);
    assert!(state.is_end);

    let again = reduce(state, PaginationAction::AdvanceRequested, BATCH, 10.0);
    assert_eq!(again.cursor, 96.0);
    assert!(again.is_end);
}

// ── Retreat ────────────────────────────────────────────────────────

#[test]
fn retreat_moves_cursor_back_and_clears_end() {
    let start = PaginationState {
        is_end: true,
        ..idle(144.0)
    };
    let next = reduce(start, PaginationAction::RetreatRequested, BATCH, 100.0);
    assert_eq!(next.cursor, 96.0);
    assert!(!next.is_end);
    assert!(next.in_progress);
}

#[test]
fn retreat_clamps_to_minimum_cursor() {
    let next = reduce(idle(10.0), PaginationAction::RetreatRequested, BATCH, 100.0);
    assert_eq!(next.cursor, MIN_CURSOR_SECONDS);
}

#[test]
fn retreat_from_origin_clamps_up_to_minimum() {
    let next = reduce(idle(0.0), PaginationAction::RetreatRequested, BATCH, 100.0);
    assert_eq!(next.cursor, 1.0);
}

// ── Single flight ──────────────────────────────────────────────────

#[test]
fn requests_while_in_progress_are_noops() {
    for action in [
        PaginationAction::AdvanceRequested,
        PaginationAction::RetreatRequested,
    ] {
        let state = busy(48.0);
        assert_eq!(reduce(state, action, BATCH, 100.0), state, "{action:?}");
    }
}

#[test]
fn load_completed_only_clears_in_progress() {
    let state = PaginationState {
        cursor: 96.0,
        is_end: true,
        in_progress: true,
    };
    let next = reduce(state, PaginationAction::LoadCompleted, BATCH, 100.0);
    assert_eq!(next.cursor, 96.0);
    assert!(next.is_end);
    assert!(!next.in_progress);
}

#[test]
fn load_completed_on_idle_state_is_harmless() {
    let state = idle(48.0);
    assert_eq!(
        reduce(state, PaginationAction::LoadCompleted, BATCH, 100.0),
        state
    );
}

// ── Walks ──────────────────────────────────────────────────────────

#[test]
fn full_walk_reaches_end_after_ceil_pages() {
    let duration = 130.0;
    let mut state = PaginationState::default();
    let mut pages = 0;
    while !state.is_end {
        state = reduce(state, PaginationAction::AdvanceRequested, BATCH, duration);
        state = reduce(state, PaginationAction::LoadCompleted, BATCH, duration);
        pages += 1;
    }
    assert_eq!(pages, 3);
    assert_eq!(state.cursor, 144.0);
}

#[test]
fn cursor_never_drops_below_minimum_on_repeated_retreat() {
    let mut state = idle(200.0);
    for _ in 0..10 {
        state = reduce(state, PaginationAction::RetreatRequested, BATCH, 300.0);
        state = reduce(state, PaginationAction::LoadCompleted, BATCH, 300.0);
        assert!(state.cursor >= MIN_CURSOR_SECONDS);
    }
    assert_eq!(state.cursor, MIN_CURSOR_SECONDS);
}

#[test]
fn custom_batch_size_is_respected() {
    let next = reduce(idle(5.0), PaginationAction::AdvanceRequested, 12.5, 100.0);
    assert_eq!(next.cursor, 17.5);
}
