//! Mode-specific interpretation of an aggregated result. Stateless per
//! call; each mode owns its verdict shape.

use crate::domain::{SamplingSettings, TestResult};

/// Performance: completion alone is success. The metrics are the output;
/// there is no pass/fail verdict.
pub fn analyze_performance(result: TestResult) -> TestResult {
    result
}

/// Acceptance: the only mode with a hard pass/fail outcome. Passes exactly
/// when the aggregate observed errors stay within the error budget.
pub fn analyze_acceptance(mut result: TestResult, sampling: &SamplingSettings) -> TestResult {
    result.passed = Some(result.report.total_errors() <= u64::from(sampling.error_budget));
    result
}

/// Monitoring: never fails the invocation; annotates the result with an
/// `errors` flag when the budget is exceeded so the caller can dispatch an
/// alert.
pub fn analyze_monitoring(mut result: TestResult, sampling: &SamplingSettings) -> TestResult {
    result.errors = result.report.total_errors() > u64::from(sampling.error_budget);
    result
}
