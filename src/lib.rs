#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Graphics-backend profiling core of the Vesper rendering engine.
//!
//! The centerpiece is [`GpuProfiler`]: real-time GPU elapsed-time measurement
//! for named scopes, built on asynchronous hardware timer queries whose
//! results only become available several frames after they are issued. The
//! profiler buffers recorded frames in a small ring, recombines the fragments
//! produced by its suspend/resume scope stack into exclusive per-stat totals,
//! and publishes them to a pluggable [`StatsSink`].
//!
//! The native graphics API sits behind the [`hal::TimerQueryBackend`] seam;
//! a deterministic simulated backend ([`hal::SimBackend`]) is provided for
//! headless use and tests.

pub mod errors;
pub mod hal;
pub mod profiler;
pub mod utils;

pub use errors::{Result, VesperError};
pub use hal::{QueryKind, SimBackend, TimerQueryBackend, TimerQueryHandle};
pub use profiler::event::{timestamp_anomaly_count, ProfilerEvent};
pub use profiler::pool::TimerQueryPool;
pub use profiler::scope::ScopedGpuStat;
pub use profiler::settings::ProfilerSettings;
pub use profiler::sink::{LogSink, MemorySink, StatsSink};
pub use profiler::{GpuProfiler, NUM_BUFFERED_FRAMES, TOTAL_STAT_NAME};
pub use utils::interner;
