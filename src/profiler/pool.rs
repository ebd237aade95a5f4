//! Timer Query Pool
//!
//! Query objects are real GPU resource allocations, so the profiler never
//! creates them per scope. The pool hands out handles from a free list and
//! takes them back when a frame slot is cleared, amortizing the creation
//! cost across the lifetime of the profiler.
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │                 TimerQueryPool                     │
//! │                                                    │
//! │  free:      [TimerQueryHandle]   (recycled)        │
//! │  allocated: u32                  (outstanding)     │
//! │                                                    │
//! │  allocate() → handle   (pop free list or create)   │
//! │  release(handle)       (recycle iff sole owner)    │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! # Recycling safety
//!
//! A released handle may still be referenced by a pending GPU read from a
//! prior in-flight frame. Handing it out again would let a new frame's
//! timestamp write race that read. [`TimerQueryPool::release`] therefore
//! re-pools a handle only when its reference count shows the pool is the
//! last owner; otherwise the handle is dropped and the backend allocates a
//! fresh one on the next miss.

use std::sync::Arc;

use crate::hal::{QueryKind, TimerQueryBackend, TimerQueryHandle};

/// Free-list cache of GPU timer-query handles of one fixed kind.
pub struct TimerQueryPool {
    backend: Arc<dyn TimerQueryBackend>,
    kind: QueryKind,
    free: Vec<TimerQueryHandle>,
    allocated: u32,
}

impl TimerQueryPool {
    /// Creates an empty pool for queries of `kind`.
    #[must_use]
    pub fn new(backend: Arc<dyn TimerQueryBackend>, kind: QueryKind) -> Self {
        Self {
            backend,
            kind,
            free: Vec::new(),
            allocated: 0,
        }
    }

    /// Hands out a query handle, reusing a pooled one when possible.
    ///
    /// Never fails; callers enforce the soft per-frame cap against
    /// [`allocated_count`](Self::allocated_count) before asking.
    pub fn allocate(&mut self) -> TimerQueryHandle {
        self.allocated += 1;
        self.free
            .pop()
            .unwrap_or_else(|| self.backend.create_timer_query(self.kind))
    }

    /// Returns a handle to the pool.
    ///
    /// The handle is recycled only if no other owner still references it;
    /// a handle aliased by a pending GPU read is dropped instead, which
    /// keeps a not-yet-retired query from being written to again.
    pub fn release(&mut self, handle: TimerQueryHandle) {
        debug_assert!(self.allocated > 0, "release without matching allocate");
        self.allocated = self.allocated.saturating_sub(1);
        if handle.reference_count() == 1 {
            self.free.push(handle);
        }
    }

    /// Number of handles currently held by profiler events.
    #[inline]
    #[must_use]
    pub fn allocated_count(&self) -> u32 {
        self.allocated
    }

    /// Number of handles sitting in the free list.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }
}
