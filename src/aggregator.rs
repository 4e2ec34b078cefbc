//! Merges distributed partial reports into one result. The merge is
//! associative and order-independent because fan-out completion order is
//! not guaranteed.

use uuid::Uuid;

use crate::domain::{Report, Script, Settings, TestResult};
use crate::error::TaskError;

/// Merge the reports of one script execution. Numeric fields sum, code and
/// error tallies merge by bucket, latency samples concatenate. Fails only
/// on an empty report set, which the executor's zero-plan short-circuit
/// makes unreachable in practice.
pub fn merge(
    time_now: i64,
    script: &Script,
    _settings: &Settings,
    reports: &[Report],
) -> Result<TestResult, TaskError> {
    if reports.is_empty() {
        return Err(TaskError::Structural(
            "a result cannot be produced from zero reports".to_string(),
        ));
    }

    let mut merged = Report::default();
    for report in reports {
        merged.absorb(report);
    }

    Ok(TestResult {
        genesis: script.genesis.unwrap_or_else(Uuid::nil),
        timestamp: time_now,
        mode: script.mode.clone(),
        report: merged,
        errors: false,
        passed: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(errors: u64) -> Report {
        let mut r = Report {
            requests_completed: 10,
            ..Report::default()
        };
        if errors > 0 {
            r.errors.insert("ETIMEDOUT".to_string(), errors);
        }
        r
    }

    fn fixture() -> (Script, Settings) {
        let script = Script {
            genesis: Some(Uuid::new_v4()),
            ..Script::default()
        };
        let settings = Settings::resolve(&script).unwrap();
        (script, settings)
    }

    #[test]
    fn test_zero_reports_is_a_structural_error() {
        let (script, settings) = fixture();
        let err = merge(0, &script, &settings, &[]).unwrap_err();
        assert!(matches!(err, TaskError::Structural(_)));
    }

    #[test]
    fn test_error_counts_sum() {
        let (script, settings) = fixture();
        let result = merge(0, &script, &settings, &[report(2), report(3)]).unwrap();
        assert_eq!(result.report.total_errors(), 5);
        assert_eq!(result.report.requests_completed, 20);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let (script, settings) = fixture();
        let reports = [report(2), report(3), report(7)];
        let forward = merge(0, &script, &settings, &reports).unwrap();
        let reversed: Vec<Report> = reports.iter().rev().cloned().collect();
        let backward = merge(0, &script, &settings, &reversed).unwrap();

        assert_eq!(forward.report.total_errors(), backward.report.total_errors());
        assert_eq!(
            forward.report.requests_completed,
            backward.report.requests_completed
        );
        assert_eq!(forward.report.errors, backward.report.errors);
    }

    #[test]
    fn test_merge_is_associative() {
        let (script, settings) = fixture();
        // merge([r1, r2]) then r3 equals merge([r1, r2, r3])
        let pair = merge(0, &script, &settings, &[report(2), report(3)]).unwrap();
        let stepwise = merge(0, &script, &settings, &[pair.report, report(7)]).unwrap();
        let all = merge(0, &script, &settings, &[report(2), report(3), report(7)]).unwrap();
        assert_eq!(stepwise.report, all.report);
    }

    #[test]
    fn test_result_carries_lineage_and_mode() {
        let (script, settings) = fixture();
        let result = merge(42, &script, &settings, &[report(0)]).unwrap();
        assert_eq!(result.genesis, script.genesis.unwrap());
        assert_eq!(result.timestamp, 42);
        assert!(result.passed.is_none());
        assert!(!result.errors);
    }
}
