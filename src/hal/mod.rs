//! Hardware Interface Seam
//!
//! The profiler never talks to a native graphics API directly. Everything
//! it needs from the render-hardware interface fits in one small contract:
//! minting timer-query objects, submitting timestamp writes into the
//! command stream, and polling results back off the asynchronous GPU
//! timeline. [`TimerQueryBackend`] is that contract; the engine's native
//! backends implement it on top of their query machinery, and
//! [`SimBackend`] implements it in-process for headless runs and tests.
//!
//! # Handle aliasing
//!
//! A timer query logically "freed" by the profiler may still be read by a
//! prior in-flight frame on the GPU timeline. [`TimerQueryHandle`] is
//! therefore reference counted: the backend retains a clone for every
//! pending write, and the query pool re-checks
//! [`TimerQueryHandle::reference_count`] before recycling a handle. A
//! release is a hint, not a guarantee of immediate reuse.

use std::sync::Arc;

pub mod sim;

pub use self::sim::SimBackend;

/// The kind of GPU query a pool hands out.
///
/// Only timestamp queries are modeled here; occlusion and disjoint queries
/// live in their own subsystems.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum QueryKind {
    Timestamp,
}

/// Reference-counted handle to a GPU timer-query object.
///
/// Clones share the underlying query. The strong count doubles as the
/// aliasing check used by [`TimerQueryPool`](crate::TimerQueryPool) when
/// deciding whether a released handle is safe to recycle.
#[derive(Clone, Debug)]
pub struct TimerQueryHandle {
    kind: QueryKind,
    id: Arc<u64>,
}

impl TimerQueryHandle {
    /// Wraps a backend-minted query id. Backends call this from
    /// [`TimerQueryBackend::create_timer_query`].
    #[must_use]
    pub fn new(kind: QueryKind, id: u64) -> Self {
        Self {
            kind,
            id: Arc::new(id),
        }
    }

    /// Backend-assigned identifier of the underlying query object.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        *self.id
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    /// Number of live owners of the underlying query, including this one.
    ///
    /// A count above 1 means some other owner (typically a pending GPU
    /// read) still references the query.
    #[inline]
    #[must_use]
    pub fn reference_count(&self) -> usize {
        Arc::strong_count(&self.id)
    }
}

/// Contract the profiler consumes from the render-hardware interface.
///
/// All methods take `&self`: implementations are expected to guard their
/// interior state themselves, since query submission is interleaved with
/// other command-stream traffic owned by the same backend.
pub trait TimerQueryBackend {
    /// Whether the device exposes timer queries at all. Checked once at
    /// profiler construction; a `false` here no-ops the whole subsystem.
    fn supports_timer_queries(&self) -> bool {
        true
    }

    /// Creates a fresh query object. This is a real GPU resource
    /// allocation; the query pool exists to amortize it across frames.
    fn create_timer_query(&self, kind: QueryKind) -> TimerQueryHandle;

    /// Enqueues a timestamp write through `query` at the current point in
    /// the command stream. The backend must retain a clone of the handle
    /// until the written value has been read back.
    fn submit_timestamp_write(&self, query: &TimerQueryHandle);

    /// Non-blocking poll for a previously submitted timestamp, in
    /// microseconds. Returns `None` while the GPU has not retired the
    /// write yet.
    fn try_read_timestamp(&self, query: &TimerQueryHandle) -> Option<u64>;

    /// Blocking variant of [`try_read_timestamp`](Self::try_read_timestamp),
    /// used only by the frame-clear drain so a recycled query can never be
    /// reused while the GPU might still write to it. Returns `None` if the
    /// query has no pending write.
    fn wait_timestamp(&self, query: &TimerQueryHandle) -> Option<u64>;
}
