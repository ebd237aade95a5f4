//! Profiler Edge-Case Tests
//!
//! Tests for:
//! - Ring pacing: a frame whose results are not ready pauses gathering,
//!   freezes the ring and drops scope traffic until a retry succeeds
//! - Query-cap degradation: scopes past the cap become zero-duration
//!   contributors instead of failing
//! - Disabled subsystem: master toggle off, or a device without timer
//!   queries, turns every call into a no-op
//! - Contract violations panic

use std::sync::Arc;

use parking_lot::Mutex;

use vesper::{GpuProfiler, ProfilerSettings, SimBackend, StatsSink, TOTAL_STAT_NAME};

const EPSILON: f32 = 1e-6;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

#[derive(Clone, Default)]
struct RecordingSink(Arc<Mutex<Vec<(String, f32)>>>);

impl RecordingSink {
    fn records(&self) -> Vec<(String, f32)> {
        self.0.lock().clone()
    }
}

impl StatsSink for RecordingSink {
    fn publish(&mut self, name: &str, milliseconds: f32) {
        self.0.lock().push((name.to_owned(), milliseconds));
    }
}

fn profiler_with(settings: ProfilerSettings) -> (Arc<SimBackend>, GpuProfiler, RecordingSink) {
    let _ = env_logger::builder().is_test(true).try_init();
    let backend = Arc::new(SimBackend::new());
    let sink = RecordingSink::default();
    let profiler = GpuProfiler::new(backend.clone(), settings, Box::new(sink.clone()));
    (backend, profiler, sink)
}

fn run_empty_frames(profiler: &mut GpuProfiler, count: usize) {
    for _ in 0..count {
        profiler.begin_frame();
        profiler.end_frame();
    }
}

// ============================================================================
// Ring Pacing
// ============================================================================

#[test]
fn unready_results_pause_gathering_and_drop_scope_traffic() {
    let (backend, mut profiler, sink) = profiler_with(ProfilerSettings::default());

    profiler.begin_frame();
    profiler.push_event("A");
    backend.advance_clock(100);
    profiler.pop_event();
    profiler.end_frame();
    run_empty_frames(&mut profiler, 2);

    // Results still pending: the read slot cannot resolve.
    profiler.begin_frame();
    profiler.end_frame();
    assert!(profiler.is_paused());
    assert!(sink.records().is_empty());

    // While paused, pushes are dropped entirely: no events, no queries.
    let allocated = profiler.allocated_query_count();
    profiler.begin_frame();
    profiler.push_event("Late");
    backend.advance_clock(100);
    profiler.pop_event();
    assert_eq!(profiler.allocated_query_count(), allocated);

    // Results arrive: the same end_frame retry resolves and unpauses.
    backend.complete_submitted();
    profiler.end_frame();
    assert!(!profiler.is_paused());

    let records = sink.records();
    let names: Vec<&str> = records.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["A", TOTAL_STAT_NAME]);
}

#[test]
fn pause_can_persist_across_many_frames() {
    let (backend, mut profiler, sink) = profiler_with(ProfilerSettings::default());

    profiler.begin_frame();
    profiler.push_event("A");
    backend.advance_clock(100);
    profiler.pop_event();
    profiler.end_frame();

    // Results never arrive: stats stay paused indefinitely, the rest of
    // the loop keeps running unaffected.
    run_empty_frames(&mut profiler, 20);
    assert!(profiler.is_paused());
    assert!(sink.records().is_empty());
    assert_eq!(profiler.allocated_query_count(), 2);
}

// ============================================================================
// Query-Cap Degradation
// ============================================================================

#[test]
fn capped_frame_degrades_resumed_fragment_to_zero() {
    let settings = ProfilerSettings {
        max_queries_per_frame: Some(2),
        ..ProfilerSettings::default()
    };
    let (backend, mut profiler, sink) = profiler_with(settings);

    // A-open and B take the two capped slots; the resumed A fragment
    // gets no queries and contributes zero.
    profiler.begin_frame();
    profiler.push_event("A");
    backend.advance_clock(100);
    profiler.push_event("B");
    backend.advance_clock(200);
    profiler.pop_event();
    backend.advance_clock(400);
    profiler.pop_event();
    profiler.end_frame();

    assert_eq!(profiler.recorded_event_count(), 0); // slot advanced
    assert_eq!(profiler.allocated_query_count(), 4);

    run_empty_frames(&mut profiler, 2);
    backend.complete_submitted();
    run_empty_frames(&mut profiler, 1);

    let records = sink.records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].0, "A");
    assert!(approx(records[0].1, 0.1)); // first fragment only
    assert_eq!(records[1].0, "B");
    assert!(approx(records[1].1, 0.2));
    assert!(approx(records[2].1, 0.3));
}

#[test]
fn cap_of_zero_degrades_every_scope() {
    let settings = ProfilerSettings {
        max_queries_per_frame: Some(0),
        ..ProfilerSettings::default()
    };
    let (backend, mut profiler, sink) = profiler_with(settings);

    profiler.begin_frame();
    profiler.push_event("A");
    backend.advance_clock(100);
    profiler.pop_event();
    profiler.end_frame();
    assert_eq!(profiler.allocated_query_count(), 0);

    // Nothing pending: the frame resolves on the spot when read.
    run_empty_frames(&mut profiler, 3);

    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert!(approx(records[0].1, 0.0));
    assert!(approx(records[1].1, 0.0));
}

// ============================================================================
// Disabled Subsystem
// ============================================================================

#[test]
fn master_toggle_off_noops_everything() {
    let settings = ProfilerSettings {
        stats_enabled: false,
        ..ProfilerSettings::default()
    };
    let (backend, mut profiler, sink) = profiler_with(settings);

    profiler.begin_frame();
    profiler.push_event("A");
    backend.advance_clock(100);
    profiler.pop_event();
    profiler.end_frame();

    assert_eq!(profiler.frame_number(), 0);
    assert_eq!(profiler.allocated_query_count(), 0);
    assert!(sink.records().is_empty());
}

#[test]
fn toggle_can_be_flipped_at_runtime() {
    let (backend, mut profiler, sink) = profiler_with(ProfilerSettings::default());

    profiler.set_stats_enabled(false);
    run_empty_frames(&mut profiler, 2);
    assert_eq!(profiler.frame_number(), 0);

    profiler.set_stats_enabled(true);
    profiler.begin_frame();
    profiler.push_event("A");
    backend.advance_clock(100);
    profiler.pop_event();
    profiler.end_frame();
    assert_eq!(profiler.frame_number(), 1);
    assert_eq!(profiler.allocated_query_count(), 2);

    run_empty_frames(&mut profiler, 2);
    backend.complete_submitted();
    run_empty_frames(&mut profiler, 1);
    assert!(!sink.records().is_empty());
}

#[test]
fn device_without_timer_queries_noops_everything() {
    let _ = env_logger::builder().is_test(true).try_init();
    let backend = Arc::new(SimBackend::without_timer_support());
    let sink = RecordingSink::default();
    let mut profiler = GpuProfiler::new(
        backend.clone(),
        ProfilerSettings::default(),
        Box::new(sink.clone()),
    );

    profiler.begin_frame();
    profiler.push_event("A");
    profiler.pop_event();
    profiler.end_frame();

    assert_eq!(profiler.allocated_query_count(), 0);
    assert_eq!(backend.pending_writes(), 0);
    assert!(sink.records().is_empty());
}

// ============================================================================
// Contract Violations
// ============================================================================

#[test]
#[should_panic(expected = "begin_frame called twice")]
fn double_begin_frame_panics() {
    let (_backend, mut profiler, _sink) = profiler_with(ProfilerSettings::default());
    profiler.begin_frame();
    profiler.begin_frame();
}

#[test]
#[should_panic(expected = "end_frame without begin_frame")]
fn end_frame_without_begin_panics() {
    let (_backend, mut profiler, _sink) = profiler_with(ProfilerSettings::default());
    profiler.end_frame();
}

#[test]
#[should_panic(expected = "pushed without a matching pop")]
fn unbalanced_push_panics_at_end_frame() {
    let (_backend, mut profiler, _sink) = profiler_with(ProfilerSettings::default());
    profiler.begin_frame();
    profiler.push_event("A");
    profiler.end_frame();
}

#[test]
#[should_panic(expected = "pop_event without a matching push_event")]
fn pop_without_push_panics() {
    let (_backend, mut profiler, _sink) = profiler_with(ProfilerSettings::default());
    profiler.begin_frame();
    profiler.pop_event();
}
