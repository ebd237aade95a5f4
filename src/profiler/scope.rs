//! Scoped Stat Guard
//!
//! RAII wrapper around [`GpuProfiler::push_event`]/[`GpuProfiler::pop_event`]
//! that guarantees the pop runs even on early return. Nested scopes are
//! opened through [`ScopedGpuStat::child`], which reborrows the same
//! profiler.
//!
//! ```rust
//! use std::sync::Arc;
//! use vesper::{GpuProfiler, MemorySink, ProfilerSettings, ScopedGpuStat, SimBackend};
//!
//! let backend = Arc::new(SimBackend::new());
//! let mut profiler = GpuProfiler::new(
//!     backend,
//!     ProfilerSettings::default(),
//!     Box::new(MemorySink::new()),
//! );
//!
//! profiler.begin_frame();
//! {
//!     let mut scene = ScopedGpuStat::new(&mut profiler, "Opaque");
//!     {
//!         let _shadows = scene.child("Shadows");
//!         // shadow pass command recording
//!     }
//!     // rest of the opaque pass
//! }
//! profiler.end_frame();
//! ```

use crate::profiler::GpuProfiler;

/// Pushes a named scope on construction and pops it on drop.
pub struct ScopedGpuStat<'a> {
    profiler: &'a mut GpuProfiler,
}

impl<'a> ScopedGpuStat<'a> {
    #[must_use]
    pub fn new(profiler: &'a mut GpuProfiler, name: &str) -> Self {
        profiler.push_event(name);
        Self { profiler }
    }

    /// Opens a nested scope under this one.
    #[must_use]
    pub fn child(&mut self, name: &str) -> ScopedGpuStat<'_> {
        ScopedGpuStat::new(self.profiler, name)
    }
}

impl Drop for ScopedGpuStat<'_> {
    fn drop(&mut self) {
        self.profiler.pop_event();
    }
}
