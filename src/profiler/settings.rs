//! Profiler Configuration
//!
//! Two knobs, read by the profiler on every frame boundary so they can be
//! flipped at runtime from the engine's console-variable layer:
//!
//! - `max_queries_per_frame`: soft cap on how many scopes per frame get a
//!   real timer-query pair. `None` means unbounded. On the JSON surface
//!   the original integer convention is kept: `-1` means unbounded.
//! - `stats_enabled`: globally no-ops the whole subsystem.

use serde::Deserialize;

use crate::errors::{Result, VesperError};

/// Runtime configuration of the GPU profiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfilerSettings {
    /// Maximum number of scopes per frame that receive a query pair;
    /// scopes past the cap degrade to zero-duration contributors.
    pub max_queries_per_frame: Option<u32>,
    /// Master toggle for the whole subsystem.
    pub stats_enabled: bool,
}

impl Default for ProfilerSettings {
    fn default() -> Self {
        Self {
            max_queries_per_frame: None,
            stats_enabled: true,
        }
    }
}

/// On-disk shape; keeps the `-1` = unbounded convention.
#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsFile {
    max_queries_per_frame: i64,
    stats_enabled: bool,
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            max_queries_per_frame: -1,
            stats_enabled: true,
        }
    }
}

impl ProfilerSettings {
    /// Parses settings from a JSON document.
    ///
    /// ```rust
    /// use vesper::ProfilerSettings;
    ///
    /// let s = ProfilerSettings::from_json(r#"{ "max_queries_per_frame": 64 }"#).unwrap();
    /// assert_eq!(s.max_queries_per_frame, Some(64));
    /// assert!(s.stats_enabled);
    /// ```
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: SettingsFile = serde_json::from_str(text)?;
        let max_queries_per_frame = match raw.max_queries_per_frame {
            -1 => None,
            n if (0..=i64::from(u32::MAX)).contains(&n) => Some(n as u32),
            n => {
                return Err(VesperError::InvalidSetting {
                    name: "max_queries_per_frame",
                    value: n.to_string(),
                })
            }
        };
        Ok(Self {
            max_queries_per_frame,
            stats_enabled: raw.stats_enabled,
        })
    }
}
