//! Profiler Event
//!
//! One recorded scope fragment: a pair of timer queries bracketing a span
//! of GPU work, plus the resolved timing once the GPU retires both writes.
//!
//! # State machine
//!
//! ```text
//! Created ──begin()──► BeginIssued ──end()──► EndIssued ──gather──► ResultsGathered
//!    │
//!    └── (pool cap reached: no queries) ─────────────────► ResultsGathered(zero)
//! ```
//!
//! The states are encoded by the data rather than an explicit tag: absent
//! queries mean the degraded path, and the `u64::MAX` sentinel in either
//! timestamp means that side has not resolved yet.

use std::sync::atomic::{AtomicU64, Ordering};

use log::warn;

use crate::hal::{TimerQueryBackend, TimerQueryHandle};
use crate::profiler::pool::TimerQueryPool;
use crate::utils::Symbol;

/// Sentinel for a timestamp that has not been read back yet.
const UNRESOLVED_MICROS: u64 = u64::MAX;

/// Counts `end < start` clamps across the process.
///
/// Timestamp inversion is a known-possible driver anomaly; results are
/// clamped to zero rather than published negative, and the counter exists
/// so the condition is observable instead of silent.
static TIMESTAMP_ANOMALIES: AtomicU64 = AtomicU64::new(0);

/// Number of times an inverted timestamp pair has been clamped to zero
/// since process start.
#[must_use]
pub fn timestamp_anomaly_count() -> u64 {
    TIMESTAMP_ANOMALIES.load(Ordering::Relaxed)
}

/// A single timed scope fragment within one profiler frame.
pub struct ProfilerEvent {
    stat: Symbol,
    start_query: Option<TimerQueryHandle>,
    end_query: Option<TimerQueryHandle>,
    start_micros: u64,
    end_micros: u64,
    frame_issued: u64,
}

impl ProfilerEvent {
    /// Creates an event backed by a freshly allocated query pair.
    pub(crate) fn with_queries(
        stat: Symbol,
        pool: &mut TimerQueryPool,
        frame_issued: u64,
    ) -> Self {
        Self {
            stat,
            start_query: Some(pool.allocate()),
            end_query: Some(pool.allocate()),
            start_micros: UNRESOLVED_MICROS,
            end_micros: UNRESOLVED_MICROS,
            frame_issued,
        }
    }

    /// Creates a query-less event for when the pool cap has been reached.
    ///
    /// Both timestamps resolve to zero immediately, so the event
    /// contributes a zero duration instead of blocking the frame forever.
    pub(crate) fn degraded(stat: Symbol, frame_issued: u64) -> Self {
        Self {
            stat,
            start_query: None,
            end_query: None,
            start_micros: 0,
            end_micros: 0,
            frame_issued,
        }
    }

    /// Submits the opening timestamp write into the command stream.
    ///
    /// Must be called from the single frame-recording context before
    /// [`end`](Self::end).
    pub(crate) fn begin(&mut self, backend: &dyn TimerQueryBackend) {
        if let Some(query) = &self.start_query {
            backend.submit_timestamp_write(query);
        }
    }

    /// Submits the closing timestamp write into the command stream.
    pub(crate) fn end(&mut self, backend: &dyn TimerQueryBackend) {
        if let Some(query) = &self.end_query {
            backend.submit_timestamp_write(query);
        }
    }

    /// Non-blocking poll for both timestamps.
    ///
    /// Returns `true` once both sides are resolved. Idempotent: resolved
    /// sides are never polled again, and a fully resolved event is a
    /// no-op.
    pub(crate) fn gather_results(&mut self, backend: &dyn TimerQueryBackend) -> bool {
        if self.start_micros == UNRESOLVED_MICROS {
            if let Some(query) = &self.start_query {
                if let Some(micros) = backend.try_read_timestamp(query) {
                    self.start_micros = micros;
                }
            }
        }
        if self.end_micros == UNRESOLVED_MICROS {
            if let Some(query) = &self.end_query {
                if let Some(micros) = backend.try_read_timestamp(query) {
                    self.end_micros = micros;
                }
            }
        }
        self.is_resolved()
    }

    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.start_micros != UNRESOLVED_MICROS && self.end_micros != UNRESOLVED_MICROS
    }

    /// Elapsed GPU time in milliseconds. Valid only once resolved.
    ///
    /// An inverted pair (`end < start`) clamps to zero and bumps the
    /// process-wide anomaly counter.
    #[must_use]
    pub fn result_milliseconds(&self) -> f32 {
        debug_assert!(self.is_resolved(), "result read before gather completed");
        if self.end_micros < self.start_micros {
            TIMESTAMP_ANOMALIES.fetch_add(1, Ordering::Relaxed);
            return 0.0;
        }
        (self.end_micros - self.start_micros) as f32 / 1000.0
    }

    #[inline]
    #[must_use]
    pub fn stat(&self) -> Symbol {
        self.stat
    }

    /// Render frame number this event was issued in.
    #[inline]
    #[must_use]
    pub fn frame_issued(&self) -> u64 {
        self.frame_issued
    }

    /// Releases both query handles back to the pool.
    ///
    /// If a `drain` backend is supplied and a side was never gathered, a
    /// best-effort blocking read retires the query first so a recycled
    /// handle can never be reused while the GPU might still write to it.
    pub(crate) fn release(
        mut self,
        pool: &mut TimerQueryPool,
        drain: Option<&dyn TimerQueryBackend>,
    ) {
        let pairs = [
            (self.start_query.take(), self.start_micros),
            (self.end_query.take(), self.end_micros),
        ];
        for (query, micros) in pairs {
            let Some(query) = query else { continue };
            if micros == UNRESOLVED_MICROS {
                if let Some(backend) = drain {
                    warn!(
                        "draining ungathered timer query from frame {}",
                        self.frame_issued
                    );
                    let _ = backend.wait_timestamp(&query);
                }
            }
            pool.release(query);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::hal::{QueryKind, SimBackend};
    use crate::utils::interner;

    fn fixture() -> (Arc<SimBackend>, TimerQueryPool) {
        let backend = Arc::new(SimBackend::new());
        let pool = TimerQueryPool::new(backend.clone(), QueryKind::Timestamp);
        (backend, pool)
    }

    #[test]
    fn resolves_after_completion() {
        let (backend, mut pool) = fixture();
        let mut ev = ProfilerEvent::with_queries(interner::intern("Opaque"), &mut pool, 1);

        ev.begin(&*backend);
        backend.advance_clock(1500);
        ev.end(&*backend);

        assert!(!ev.gather_results(&*backend));
        backend.complete_submitted();
        assert!(ev.gather_results(&*backend));
        assert!((ev.result_milliseconds() - 1.5).abs() < 1e-6);

        ev.release(&mut pool, None);
        assert_eq!(pool.allocated_count(), 0);
    }

    #[test]
    fn gather_is_idempotent() {
        let (backend, mut pool) = fixture();
        let mut ev = ProfilerEvent::with_queries(interner::intern("Shadows"), &mut pool, 1);
        ev.begin(&*backend);
        ev.end(&*backend);
        backend.complete_submitted();

        assert!(ev.gather_results(&*backend));
        // Resolved sides are not polled again.
        assert!(ev.gather_results(&*backend));
        ev.release(&mut pool, None);
    }

    #[test]
    fn degraded_event_is_zero_and_immediately_resolved() {
        let (backend, mut pool) = fixture();
        let mut ev = ProfilerEvent::degraded(interner::intern("Bloom"), 3);

        ev.begin(&*backend);
        ev.end(&*backend);
        assert!(ev.gather_results(&*backend));
        assert_eq!(ev.result_milliseconds(), 0.0);
        assert_eq!(ev.frame_issued(), 3);

        ev.release(&mut pool, None);
        assert_eq!(pool.allocated_count(), 0);
    }

    #[test]
    fn inverted_timestamps_clamp_to_zero() {
        let ev = ProfilerEvent {
            stat: interner::intern("Prepass"),
            start_query: None,
            end_query: None,
            start_micros: 5000,
            end_micros: 200,
            frame_issued: 1,
        };

        let before = timestamp_anomaly_count();
        assert_eq!(ev.result_milliseconds(), 0.0);
        assert_eq!(timestamp_anomaly_count(), before + 1);
    }

    #[test]
    fn release_with_drain_retires_ungathered_queries() {
        let (backend, mut pool) = fixture();
        let mut ev = ProfilerEvent::with_queries(interner::intern("Fxaa"), &mut pool, 1);
        ev.begin(&*backend);
        ev.end(&*backend);

        // Never gathered, never completed: the drain forces retirement so
        // both handles come back recyclable.
        ev.release(&mut pool, Some(&*backend));
        assert_eq!(pool.allocated_count(), 0);
        assert_eq!(pool.free_count(), 2);
        assert_eq!(backend.pending_writes(), 0);
    }
}
