use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw output of executing one plan through the load engine. Treated as a
/// mergeable record: counts sum, code and error tallies merge by bucket,
/// latency samples concatenate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub requests_completed: u64,
    #[serde(default)]
    pub codes: BTreeMap<u16, u64>,
    #[serde(default)]
    pub errors: BTreeMap<String, u64>,
    #[serde(default)]
    pub latency_ms: Vec<f64>,
}

impl Report {
    pub fn total_errors(&self) -> u64 {
        self.errors.values().sum()
    }

    /// Fold another report into this one. Commutative up to latency sample
    /// order, which keeps the aggregate independent of fan-in completion
    /// order.
    pub fn absorb(&mut self, other: &Report) {
        self.requests_completed += other.requests_completed;
        for (code, count) in &other.codes {
            *self.codes.entry(*code).or_insert(0) += count;
        }
        for (error, count) in &other.errors {
            *self.errors.entry(error.clone()).or_insert(0) += count;
        }
        self.latency_ms.extend_from_slice(&other.latency_ms);
    }
}

/// The merged report set for one script execution, tagged with its lineage
/// and the analysis outputs of the script's mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub genesis: Uuid,
    /// Merge time, epoch milliseconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    pub report: Report,
    /// Monitoring: set when the aggregate error count exceeds the budget.
    #[serde(default)]
    pub errors: bool,
    /// Acceptance: the binary verdict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(completed: u64, errors: &[(&str, u64)]) -> Report {
        Report {
            requests_completed: completed,
            errors: errors
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            ..Report::default()
        }
    }

    #[test]
    fn test_absorb_sums_counts_and_buckets() {
        let mut merged = report(10, &[("ECONNREFUSED", 2)]);
        merged.absorb(&report(5, &[("ECONNREFUSED", 1), ("ETIMEDOUT", 3)]));

        assert_eq!(merged.requests_completed, 15);
        assert_eq!(merged.errors["ECONNREFUSED"], 3);
        assert_eq!(merged.errors["ETIMEDOUT"], 3);
        assert_eq!(merged.total_errors(), 6);
    }

    #[test]
    fn test_absorb_concatenates_latency_samples() {
        let mut merged = Report {
            latency_ms: vec![1.0, 2.0],
            ..Report::default()
        };
        merged.absorb(&Report {
            latency_ms: vec![3.0],
            ..Report::default()
        });
        assert_eq!(merged.latency_ms, vec![1.0, 2.0, 3.0]);
    }
}
