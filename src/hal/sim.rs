//! Simulated GPU Timeline
//!
//! [`SimBackend`] implements [`TimerQueryBackend`] against an in-process
//! model of the asynchronous GPU timeline:
//!
//! - a manual microsecond clock ([`SimBackend::advance_clock`]) stands in
//!   for GPU execution time,
//! - submitted timestamp writes capture the clock immediately but stay
//!   unreadable until the completion watermark passes them
//!   ([`SimBackend::complete_submitted`]), mirroring the multi-frame
//!   latency of real query results,
//! - every pending write retains a clone of its handle, so reference-count
//!   based pool recycling behaves exactly as it does against a live
//!   backend.
//!
//! The backend is deterministic, which makes it the workhorse of the
//! profiler test suite and of headless tooling.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::{QueryKind, TimerQueryBackend, TimerQueryHandle};

struct PendingWrite {
    micros: u64,
    seq: u64,
    /// Keeps the handle's reference count elevated until the value is
    /// read back, like a real in-flight GPU read would.
    _retained: TimerQueryHandle,
}

#[derive(Default)]
struct SimState {
    clock_micros: u64,
    next_id: u64,
    next_seq: u64,
    /// Writes with `seq < completed_seq` are readable.
    completed_seq: u64,
    pending: FxHashMap<u64, PendingWrite>,
}

/// Deterministic in-process implementation of [`TimerQueryBackend`].
pub struct SimBackend {
    supported: bool,
    state: Mutex<SimState>,
}

impl SimBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            supported: true,
            state: Mutex::new(SimState::default()),
        }
    }

    /// A backend whose device lacks timer-query support. The profiler
    /// built on top of it turns into a pile of no-ops.
    #[must_use]
    pub fn without_timer_support() -> Self {
        Self {
            supported: false,
            state: Mutex::new(SimState::default()),
        }
    }

    /// Advances the simulated GPU clock.
    pub fn advance_clock(&self, micros: u64) {
        self.state.lock().clock_micros += micros;
    }

    /// Current simulated GPU time in microseconds.
    #[must_use]
    pub fn clock_micros(&self) -> u64 {
        self.state.lock().clock_micros
    }

    /// Marks every timestamp write submitted so far as retired, making
    /// its result readable. Writes submitted after this call stay pending
    /// until the next one.
    pub fn complete_submitted(&self) {
        let mut state = self.state.lock();
        state.completed_seq = state.next_seq;
    }

    /// Number of writes whose results have not been read back yet.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.state.lock().pending.len()
    }
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerQueryBackend for SimBackend {
    fn supports_timer_queries(&self) -> bool {
        self.supported
    }

    fn create_timer_query(&self, kind: QueryKind) -> TimerQueryHandle {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        TimerQueryHandle::new(kind, id)
    }

    fn submit_timestamp_write(&self, query: &TimerQueryHandle) {
        let mut state = self.state.lock();
        let micros = state.clock_micros;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.pending.insert(
            query.id(),
            PendingWrite {
                micros,
                seq,
                _retained: query.clone(),
            },
        );
    }

    fn try_read_timestamp(&self, query: &TimerQueryHandle) -> Option<u64> {
        let mut state = self.state.lock();
        let retired = state
            .pending
            .get(&query.id())
            .is_some_and(|w| w.seq < state.completed_seq);
        if retired {
            // Reading retires the write and drops the retained handle.
            state.pending.remove(&query.id()).map(|w| w.micros)
        } else {
            None
        }
    }

    fn wait_timestamp(&self, query: &TimerQueryHandle) -> Option<u64> {
        // Forces retirement regardless of the watermark.
        self.state.lock().pending.remove(&query.id()).map(|w| w.micros)
    }
}
