//! Stats Sinks
//!
//! Once a frame's timings fully resolve, the profiler publishes one
//! aggregated millisecond value per stat (plus the synthetic total) to a
//! [`StatsSink`]. The sink is opaque to the profiler: telemetry, a debug
//! HUD, a log stream and a test recorder all look the same from here.

use rustc_hash::FxHashMap;

/// Receiver for aggregated per-stat GPU timings.
pub trait StatsSink {
    /// Called once per stat per resolved frame, in issue order, with the
    /// synthetic total last.
    fn publish(&mut self, name: &str, milliseconds: f32);
}

/// Sink that forwards every stat to the `log` facade.
pub struct LogSink;

impl StatsSink for LogSink {
    fn publish(&mut self, name: &str, milliseconds: f32) {
        log::trace!("gpu stat {name}: {milliseconds:.3} ms");
    }
}

/// Sink that keeps the most recent value per stat, for overlay/HUD use.
#[derive(Default)]
pub struct MemorySink {
    latest: FxHashMap<String, f32>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent published value for `name`, if any frame carrying it
    /// has resolved.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f32> {
        self.latest.get(name).copied()
    }

    /// All stats seen so far with their most recent values.
    #[must_use]
    pub fn latest(&self) -> &FxHashMap<String, f32> {
        &self.latest
    }

    pub fn clear(&mut self) {
        self.latest.clear();
    }
}

impl StatsSink for MemorySink {
    fn publish(&mut self, name: &str, milliseconds: f32) {
        self.latest.insert(name.to_owned(), milliseconds);
    }
}
