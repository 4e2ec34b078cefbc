use serde::{Deserialize, Serialize};

use super::script::{Sampling, Script};
use crate::error::TaskError;

// Documented inclusive bounds for the splitting ceilings. The chunk
// duration window leaves headroom inside a worker's hard duration ceiling
// for planning and report delivery.
pub const MIN_CHUNK_DURATION_IN_SECONDS: u64 = 15;
pub const MAX_CHUNK_DURATION_IN_SECONDS: u64 = 285;
pub const DEFAULT_MAX_CHUNK_DURATION_IN_SECONDS: u64 = 240;

pub const MAX_SCRIPT_DURATION_IN_SECONDS: u64 = 518_400;
pub const DEFAULT_MAX_SCRIPT_DURATION_IN_SECONDS: u64 = 86_400;

pub const MAX_CHUNK_REQUESTS_PER_SECOND: u64 = 500;
pub const DEFAULT_MAX_CHUNK_REQUESTS_PER_SECOND: u64 = 25;

pub const MAX_SCRIPT_REQUESTS_PER_SECOND: u64 = 50_000;
pub const DEFAULT_MAX_SCRIPT_REQUESTS_PER_SECOND: u64 = 5_000;

pub const MAX_TIME_BUFFER_IN_MILLISECONDS: u64 = 300_000;
pub const DEFAULT_TIME_BUFFER_IN_MILLISECONDS: u64 = 15_000;

/// Resolved numeric ceilings for one execution, plus the resolved sampling
/// parameters for the script's mode. Constructed once per invocation and
/// read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub max_chunk_duration_in_seconds: u64,
    pub max_script_duration_in_seconds: u64,
    pub max_chunk_requests_per_second: u64,
    pub max_script_requests_per_second: u64,
    /// Safety margin subtracted from a plan's scheduled delay to offset
    /// worker-spawn latency.
    pub time_buffer_in_milliseconds: u64,
    pub sampling: SamplingSettings,
}

/// Fully resolved sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingSettings {
    /// Repetitions per scenario.
    pub size: u32,
    /// Mean pause between successive samples, seconds.
    pub average_pause: f64,
    /// Half-width of the pause interval, seconds.
    pub pause_variance: f64,
    /// Failed samples tolerated before the verdict turns negative.
    pub error_budget: u32,
    /// Fraction of the duration ceiling past which a warning is emitted.
    pub warning_threshold: f64,
}

impl SamplingSettings {
    /// Apply user-supplied overrides field by field.
    pub fn with_overrides(self, overrides: Option<&Sampling>) -> Self {
        let Some(o) = overrides else { return self };
        SamplingSettings {
            size: o.size.unwrap_or(self.size),
            average_pause: o.average_pause.unwrap_or(self.average_pause),
            pause_variance: o.pause_variance.unwrap_or(self.pause_variance),
            error_budget: o.error_budget.unwrap_or(self.error_budget),
            warning_threshold: o.warning_threshold.unwrap_or(self.warning_threshold),
        }
    }

    /// Render back into a script-carried block with every field populated.
    pub fn as_overrides(&self) -> Sampling {
        Sampling {
            size: Some(self.size),
            average_pause: Some(self.average_pause),
            pause_variance: Some(self.pause_variance),
            error_budget: Some(self.error_budget),
            warning_threshold: Some(self.warning_threshold),
        }
    }
}

impl Settings {
    /// Resolve the effective settings for a script: documented defaults
    /// overridden by the script's `split` block, and the sampling table for
    /// the script's mode overridden by its `sampling` block.
    pub fn resolve(script: &Script) -> Result<Self, TaskError> {
        let mode = script.modality()?;
        let split = script.split.clone().unwrap_or_default();
        Ok(Settings {
            max_chunk_duration_in_seconds: split
                .max_chunk_duration_in_seconds
                .unwrap_or(DEFAULT_MAX_CHUNK_DURATION_IN_SECONDS),
            max_script_duration_in_seconds: split
                .max_script_duration_in_seconds
                .unwrap_or(DEFAULT_MAX_SCRIPT_DURATION_IN_SECONDS),
            max_chunk_requests_per_second: split
                .max_chunk_requests_per_second
                .unwrap_or(DEFAULT_MAX_CHUNK_REQUESTS_PER_SECOND),
            max_script_requests_per_second: split
                .max_script_requests_per_second
                .unwrap_or(DEFAULT_MAX_SCRIPT_REQUESTS_PER_SECOND),
            time_buffer_in_milliseconds: split
                .time_buffer_in_milliseconds
                .unwrap_or(DEFAULT_TIME_BUFFER_IN_MILLISECONDS),
            sampling: crate::sampling::defaults_for(mode).with_overrides(script.sampling.as_ref()),
        })
    }
}
