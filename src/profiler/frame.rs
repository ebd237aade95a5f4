//! Profiler Frame
//!
//! One ring-buffer slot: every event recorded for a single render frame,
//! plus the live scope stack used while recording.
//!
//! # Suspend/resume scope stack
//!
//! A timer-query pair can measure exactly one open interval; the hardware
//! has no notion of "pause the parent while the child runs". Nesting is
//! faked on top of that primitive:
//!
//! - pushing a child first *ends* the parent's open fragment, so the
//!   parent's running event covers only the time before the child,
//! - popping the child ends it and begins a *brand-new* event for the
//!   resumed parent (the old fragment is already sealed and immutable).
//!
//! A call tree of depth D therefore issues up to 2×D-1 events. The
//! fragments of one logical stat are recombined by
//! [`ProfilerFrame::update_stats`]: first occurrence sets the published
//! value, later
//! occurrences add to it. The result is *exclusive* per-stat time; child
//! durations are never double-counted into parents.
//!
//! ```text
//! push A        push B        pop (B)        pop (A)
//!   │             │              │              │
//!   A₀ begins     A₀ ends        B ends         A₁ ends
//!                 B begins       A₁ begins
//!
//! published:  A = A₀ + A₁,  B = B,  Total = A₀ + B + A₁
//! ```

use std::collections::hash_map::Entry;
use std::sync::Once;

use log::warn;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::hal::TimerQueryBackend;
use crate::profiler::event::ProfilerEvent;
use crate::profiler::pool::TimerQueryPool;
use crate::profiler::sink::StatsSink;
use crate::utils::{interner, Symbol};

/// Name under which the frame's grand total is published.
pub const TOTAL_STAT_NAME: &str = "Total";

/// Logged once per process when the query cap first bites, not per
/// occurrence, which would spam every subsequent frame.
static QUERY_CAP_WARNING: Once = Once::new();

/// One entry of the live scope stack.
///
/// `event` indexes the stat's *currently open* fragment in `events`; it is
/// re-pointed at a fresh event whenever the scope is resumed after a child
/// pops.
struct ScopeEntry {
    stat: Symbol,
    event: usize,
}

/// Recording state for one render frame, reused every N frames.
pub(crate) struct ProfilerFrame {
    frame_number: u64,
    /// Append-only; insertion order is issue order, which the aggregation
    /// in [`update_stats`](Self::update_stats) depends on.
    events: Vec<ProfilerEvent>,
    active: SmallVec<[ScopeEntry; 8]>,
    /// Events granted a real query pair this frame, checked against the
    /// per-frame cap.
    timed_events: u32,
    /// Reused aggregation scratch, keyed by stat.
    stat_index: FxHashMap<Symbol, usize>,
}

impl ProfilerFrame {
    pub(crate) fn new() -> Self {
        Self {
            frame_number: 0,
            events: Vec::new(),
            active: SmallVec::new(),
            timed_events: 0,
            stat_index: FxHashMap::default(),
        }
    }

    /// Stamps the slot with the render frame it is about to record.
    pub(crate) fn begin_recording(&mut self, frame_number: u64) {
        debug_assert!(self.events.is_empty(), "slot reused before clear");
        self.frame_number = frame_number;
    }

    #[inline]
    pub(crate) fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Opens a scope: suspends the enclosing scope's fragment (if any) and
    /// begins a new event for `stat`.
    pub(crate) fn push_event(
        &mut self,
        stat: Symbol,
        pool: &mut TimerQueryPool,
        backend: &dyn TimerQueryBackend,
        max_timed_events: Option<u32>,
    ) {
        // Exclusive semantics: the parent's open fragment stops here so
        // the child's time is never counted into it.
        if let Some(top) = self.active.last() {
            self.events[top.event].end(backend);
        }

        let event = self.begin_fragment(stat, pool, backend, max_timed_events);
        self.active.push(ScopeEntry { stat, event });
    }

    /// Closes the innermost scope and resumes its parent with a fresh
    /// fragment.
    ///
    /// # Panics
    /// Panics if no scope is open; a pop without a matching push is a
    /// caller contract violation.
    pub(crate) fn pop_event(
        &mut self,
        pool: &mut TimerQueryPool,
        backend: &dyn TimerQueryBackend,
        max_timed_events: Option<u32>,
    ) {
        let entry = self
            .active
            .pop()
            .expect("pop_event without a matching push_event");
        self.events[entry.event].end(backend);

        // The parent's previous fragment is sealed; resuming it means a
        // brand-new event for the same stat.
        if let Some(last) = self.active.len().checked_sub(1) {
            let stat = self.active[last].stat;
            let event = self.begin_fragment(stat, pool, backend, max_timed_events);
            self.active[last].event = event;
        }
    }

    fn begin_fragment(
        &mut self,
        stat: Symbol,
        pool: &mut TimerQueryPool,
        backend: &dyn TimerQueryBackend,
        max_timed_events: Option<u32>,
    ) -> usize {
        let within_cap = max_timed_events.is_none_or(|cap| self.timed_events < cap);
        let mut event = if within_cap {
            self.timed_events += 1;
            ProfilerEvent::with_queries(stat, pool, self.frame_number)
        } else {
            QUERY_CAP_WARNING.call_once(|| {
                warn!(
                    "GPU timer query cap reached in frame {}; stat results will be incomplete",
                    self.frame_number
                );
            });
            ProfilerEvent::degraded(stat, self.frame_number)
        };
        event.begin(backend);
        self.events.push(event);
        self.events.len() - 1
    }

    /// Whether every pushed scope has been popped.
    #[inline]
    pub(crate) fn is_balanced(&self) -> bool {
        self.active.is_empty()
    }

    #[inline]
    pub(crate) fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Attempts to resolve and publish this frame's stats.
    ///
    /// All-or-nothing: returns `false` without publishing anything if any
    /// event is still unresolved. Once everything has resolved, fragments
    /// sharing a stat are summed in issue order (first occurrence sets,
    /// later ones add) and a synthetic [`TOTAL_STAT_NAME`] accumulates
    /// across all events.
    pub(crate) fn update_stats(
        &mut self,
        backend: &dyn TimerQueryBackend,
        sink: &mut dyn StatsSink,
    ) -> bool {
        for event in &mut self.events {
            if !event.gather_results(backend) {
                return false;
            }
        }

        if self.events.is_empty() {
            return true;
        }

        self.stat_index.clear();
        let mut totals: SmallVec<[(Symbol, f32); 16]> = SmallVec::new();
        let mut grand_total = 0.0f32;

        for event in &self.events {
            let ms = event.result_milliseconds();
            grand_total += ms;
            match self.stat_index.entry(event.stat()) {
                Entry::Occupied(slot) => totals[*slot.get()].1 += ms,
                Entry::Vacant(slot) => {
                    slot.insert(totals.len());
                    totals.push((event.stat(), ms));
                }
            }
        }

        for (stat, ms) in &totals {
            sink.publish(interner::resolve(*stat), *ms);
        }
        sink.publish(TOTAL_STAT_NAME, grand_total);

        true
    }

    /// Returns every event's queries to the pool and empties the slot.
    ///
    /// When a `drain` backend is supplied, queries whose results were
    /// never gathered are read with a best-effort blocking wait first, so
    /// a recycled handle cannot collide with a still-pending GPU write
    /// (abnormal path only; resolved frames drain nothing).
    pub(crate) fn clear(
        &mut self,
        pool: &mut TimerQueryPool,
        drain: Option<&dyn TimerQueryBackend>,
    ) {
        for event in self.events.drain(..) {
            event.release(pool, drain);
        }
        self.active.clear();
        self.timed_events = 0;
    }
}
