use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TaskError;

/// Execution modes a script can request. Performance is the default when no
/// mode attribute is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Performance,
    Acceptance,
    Monitoring,
}

/// Mode tokens accepted in a script's `mode` attribute, long and short forms.
pub const MODE_TOKENS: &[&str] = &[
    "perf",
    "performance",
    "acc",
    "acceptance",
    "mon",
    "monitoring",
];

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "perf" | "performance" => Ok(Mode::Performance),
            "acc" | "acceptance" => Ok(Mode::Acceptance),
            "mon" | "monitoring" => Ok(Mode::Monitoring),
            _ => Err(format!("Unknown mode: {}", s)),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Performance => write!(f, "performance"),
            Mode::Acceptance => write!(f, "acceptance"),
            Mode::Monitoring => write!(f, "monitoring"),
        }
    }
}

/// A load-test specification.
///
/// Immutable once validated; the planner and sampling engine only ever
/// produce derived copies. The lineage fields (`genesis`, `start`, `trace`,
/// `simulation`) are threaded through every derived fragment so spawned
/// workers inherit them, and are not user-authored at the top level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub config: ScriptConfig,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling: Option<Sampling>,
    /// Per-script overrides for the splitting ceilings, carried along so
    /// spawned workers resolve the same settings as their parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitOverrides>,
    /// Lineage id shared by every plan descending from one top-level run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genesis: Option<Uuid>,
    /// Absolute scheduled start, epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(default)]
    pub trace: bool,
    /// Route fan-out through the in-process loopback instead of real spawns.
    #[serde(default)]
    pub simulation: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptConfig {
    #[serde(default)]
    pub phases: Vec<Phase>,
}

/// One time-bounded load stage: hold `requests_per_second` for
/// `duration_in_seconds`. A rate of zero is an idle gap, which the planner
/// produces when splitting a chunk by width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub duration_in_seconds: u64,
    pub requests_per_second: u64,
}

/// A request flow. The conductor never interprets the flow body; it is
/// handed to the load engine untouched. Only the scenario count matters to
/// the sampling math.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub flow: serde_json::Value,
}

/// User-supplied sampling overrides. Each field individually overrides the
/// mode's default; the sampling engine fills in the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sampling {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_pause: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_variance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_budget: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_threshold: Option<f64>,
}

/// User-supplied overrides for the splitting ceilings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SplitOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chunk_duration_in_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_script_duration_in_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chunk_requests_per_second: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_script_requests_per_second: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_buffer_in_milliseconds: Option<u64>,
}

impl Script {
    /// Resolve the script's modality, defaulting to performance when no
    /// mode attribute is present.
    pub fn modality(&self) -> Result<Mode, TaskError> {
        match &self.mode {
            None => Ok(Mode::Performance),
            Some(token) => token.parse().map_err(|_| {
                let list = MODE_TOKENS
                    .iter()
                    .map(|m| format!("\"{}\"", m))
                    .collect::<Vec<_>>()
                    .join(", ");
                TaskError::Configuration(format!(
                    "If specified, the mode attribute must be one of: {}.",
                    list
                ))
            }),
        }
    }

    /// Scenario count as used by the sampling math; a script without
    /// explicit scenarios still samples as one flow.
    pub fn scenario_count(&self) -> usize {
        self.scenarios.len().max(1)
    }
}
