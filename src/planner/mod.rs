//! Converts a validated script into an ordered set of plans, each sized to
//! fit inside one worker invocation.

pub mod performance;
pub mod samples;

pub use performance::plan_performance;
pub use samples::plan_samples;

use crate::domain::Script;

/// Total duration over all phases, or the index of the first phase whose
/// duration is invalid.
pub fn script_duration_in_seconds(script: &Script) -> Result<u64, usize> {
    let mut total = 0u64;
    for (index, phase) in script.config.phases.iter().enumerate() {
        if phase.duration_in_seconds == 0 {
            return Err(index);
        }
        total += phase.duration_in_seconds;
    }
    Ok(total)
}

/// Peak requests per second across all phases. Zero-rate phases are idle
/// gaps and do not contribute.
pub fn script_requests_per_second(script: &Script) -> u64 {
    script
        .config
        .phases
        .iter()
        .map(|phase| phase.requests_per_second)
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Phase, ScriptConfig};

    fn script(phases: Vec<(u64, u64)>) -> Script {
        Script {
            config: ScriptConfig {
                phases: phases
                    .into_iter()
                    .map(|(duration, rate)| Phase {
                        name: None,
                        duration_in_seconds: duration,
                        requests_per_second: rate,
                    })
                    .collect(),
            },
            ..Script::default()
        }
    }

    #[test]
    fn test_duration_sums_phases() {
        assert_eq!(
            script_duration_in_seconds(&script(vec![(60, 10), (30, 5)])),
            Ok(90)
        );
    }

    #[test]
    fn test_duration_reports_offending_phase() {
        assert_eq!(
            script_duration_in_seconds(&script(vec![(60, 10), (0, 5)])),
            Err(1)
        );
    }

    #[test]
    fn test_requests_per_second_is_the_peak() {
        assert_eq!(script_requests_per_second(&script(vec![(60, 10), (30, 25)])), 25);
        assert_eq!(script_requests_per_second(&script(vec![])), 0);
    }
}
