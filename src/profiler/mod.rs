//! Real-Time GPU Profiler
//!
//! Measures elapsed GPU time for named scopes across a CPU/GPU pipeline
//! where results arrive several frames after they are requested.
//!
//! # Frame ring buffer
//!
//! ```text
//! frames: [ slot0 ][ slot1 ][ slot2 ][ slot3 ]     N = 4
//!              ▲        ▲
//!              │        └── read_index  (oldest unresolved frame)
//!              └─────────── write_index (frame being recorded)
//!
//! read_index lags write_index by N-1 slots, so a recorded frame has
//! N-1 frames of slack to resolve before its slot is needed again.
//! ```
//!
//! Each render frame the driver brackets its scope work with
//! [`GpuProfiler::begin_frame`]/[`GpuProfiler::end_frame`]. `end_frame`
//! tries to resolve the oldest recorded slot; on success the ring
//! advances and the slot's aggregated stats are published. On failure,
//! the expected condition while the GPU is still catching up, gathering
//! pauses: indices freeze and Push/Pop become no-ops until a later
//! `end_frame` succeeds. One whole frame of stats is dropped rather than
//! blocking the CPU or overwriting data the GPU may still be writing.
//!
//! The profiler is process-wide state with an explicit lifecycle: the
//! frame driver owns it, constructs it at renderer start-up and calls
//! [`GpuProfiler::release`] at shutdown. There is no ambient global.

use std::sync::Arc;

use log::trace;

pub mod event;
pub mod pool;
pub mod scope;
pub mod settings;
pub mod sink;

mod frame;

pub use self::frame::TOTAL_STAT_NAME;

use crate::hal::{QueryKind, TimerQueryBackend};
use crate::utils::interner;

use self::frame::ProfilerFrame;
use self::pool::TimerQueryPool;
use self::settings::ProfilerSettings;
use self::sink::StatsSink;

/// Ring size: enough slack for timer queries to resolve without the CPU
/// ever blocking in the common case. Smaller rings pause more often;
/// larger ones hold more queries and memory at steady state.
pub const NUM_BUFFERED_FRAMES: usize = 4;

/// Real-time GPU profiler: ring of recording frames over a pooled set of
/// timer queries.
pub struct GpuProfiler {
    backend: Arc<dyn TimerQueryBackend>,
    pool: TimerQueryPool,
    frames: Vec<ProfilerFrame>,
    write_index: usize,
    read_index: usize,
    /// Set when the oldest frame failed to resolve at `end_frame`;
    /// freezes the ring and drops scope traffic until a retry succeeds.
    gathering_paused: bool,
    /// Guards begin/end balance.
    in_frame_block: bool,
    frame_number: u64,
    settings: ProfilerSettings,
    sink: Box<dyn StatsSink>,
    /// Device capability, sampled once at construction.
    supported: bool,
}

impl GpuProfiler {
    /// Builds the profiler over a query backend and a stats sink.
    #[must_use]
    pub fn new(
        backend: Arc<dyn TimerQueryBackend>,
        settings: ProfilerSettings,
        sink: Box<dyn StatsSink>,
    ) -> Self {
        let supported = backend.supports_timer_queries();
        let pool = TimerQueryPool::new(backend.clone(), QueryKind::Timestamp);
        Self {
            backend,
            pool,
            frames: (0..NUM_BUFFERED_FRAMES).map(|_| ProfilerFrame::new()).collect(),
            write_index: 0,
            // Lags the write index by N-1 slots.
            read_index: 1,
            gathering_paused: false,
            in_frame_block: false,
            frame_number: 0,
            settings,
            sink,
            supported,
        }
    }

    #[inline]
    fn enabled(&self) -> bool {
        self.supported && self.settings.stats_enabled
    }

    /// Opens the per-frame Begin/End block.
    ///
    /// # Panics
    /// Panics if the previous frame block was never closed.
    pub fn begin_frame(&mut self) {
        assert!(
            !self.in_frame_block,
            "begin_frame called twice without an intervening end_frame"
        );
        self.in_frame_block = true;

        if !self.enabled() {
            return;
        }
        self.frame_number += 1;
        if !self.gathering_paused {
            // The write slot was cleared when the ring last advanced.
            self.frames[self.write_index].begin_recording(self.frame_number);
        }
    }

    /// Opens a named scope in the current frame.
    ///
    /// No-op while gathering is paused, outside a frame block, or when
    /// the subsystem is disabled.
    pub fn push_event(&mut self, name: &str) {
        if !self.in_frame_block || self.gathering_paused || !self.enabled() {
            return;
        }
        let stat = interner::intern(name);
        let cap = self.settings.max_queries_per_frame;
        self.frames[self.write_index].push_event(stat, &mut self.pool, &*self.backend, cap);
    }

    /// Closes the innermost open scope. Same no-op conditions as
    /// [`push_event`](Self::push_event).
    pub fn pop_event(&mut self) {
        if !self.in_frame_block || self.gathering_paused || !self.enabled() {
            return;
        }
        let cap = self.settings.max_queries_per_frame;
        self.frames[self.write_index].pop_event(&mut self.pool, &*self.backend, cap);
    }

    /// Closes the frame block and tries to resolve the oldest recorded
    /// frame.
    ///
    /// On success the resolved slot's stats are published, the slot is
    /// cleared and the ring advances. On failure gathering pauses until a
    /// later call succeeds.
    ///
    /// # Panics
    /// Panics if called without a matching [`begin_frame`](Self::begin_frame),
    /// or if a scope pushed this frame was never popped.
    pub fn end_frame(&mut self) {
        assert!(self.in_frame_block, "end_frame without begin_frame");
        self.in_frame_block = false;

        if !self.enabled() {
            return;
        }

        assert!(
            self.frames[self.write_index].is_balanced(),
            "a GPU stat scope was pushed without a matching pop this frame"
        );

        let read = self.read_index;
        if self.frames[read].update_stats(&*self.backend, self.sink.as_mut()) {
            self.frames[read].clear(&mut self.pool, None);
            self.write_index = (self.write_index + 1) % NUM_BUFFERED_FRAMES;
            self.read_index = (self.read_index + 1) % NUM_BUFFERED_FRAMES;
            self.gathering_paused = false;
        } else {
            trace!(
                "gpu stats for frame {} not ready; pausing gathering",
                self.frames[read].frame_number()
            );
            self.gathering_paused = true;
        }
    }

    /// Shuts the profiler down: drains and returns every outstanding
    /// query. Call once at renderer teardown.
    pub fn release(&mut self) {
        for frame in &mut self.frames {
            frame.clear(&mut self.pool, Some(&*self.backend));
        }
        self.gathering_paused = false;
        debug_assert_eq!(
            self.pool.allocated_count(),
            0,
            "timer queries leaked across profiler shutdown"
        );
    }

    // ── Runtime configuration ──────────────────────────────────────────────

    pub fn set_stats_enabled(&mut self, enabled: bool) {
        self.settings.stats_enabled = enabled;
    }

    /// `None` removes the cap.
    pub fn set_max_queries_per_frame(&mut self, cap: Option<u32>) {
        self.settings.max_queries_per_frame = cap;
    }

    #[must_use]
    pub fn settings(&self) -> &ProfilerSettings {
        &self.settings
    }

    // ── Introspection (debug HUD) ──────────────────────────────────────────

    /// Whether the ring is currently frozen waiting on query results.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.gathering_paused
    }

    /// Render frames recorded since construction.
    #[must_use]
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Timer queries currently held by recorded events across all slots.
    #[must_use]
    pub fn allocated_query_count(&self) -> u32 {
        self.pool.allocated_count()
    }

    /// Events recorded so far in the frame being written.
    #[must_use]
    pub fn recorded_event_count(&self) -> usize {
        self.frames[self.write_index].event_count()
    }
}
