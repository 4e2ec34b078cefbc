//! Sampling engine: resolves effective sampling parameters for
//! acceptance- and monitoring-style scripts from mode-keyed defaults
//! tables, with every field individually overridable by the script.

use crate::diagnostics::DiagnosticSink;
use crate::domain::{Mode, SamplingSettings, Script, Settings};
use crate::error::TaskError;
use crate::validator;

/// Acceptance: a single sample per scenario and zero tolerance for failure.
pub const ACCEPTANCE_DEFAULTS: SamplingSettings = SamplingSettings {
    size: 1,
    average_pause: 0.2,
    pause_variance: 0.1,
    error_budget: 0,
    warning_threshold: 0.9,
};

/// Monitoring: repeated samples with a tolerant, alert-driven budget.
pub const MONITORING_DEFAULTS: SamplingSettings = SamplingSettings {
    size: 5,
    average_pause: 0.2,
    pause_variance: 0.1,
    error_budget: 4,
    warning_threshold: 0.9,
};

/// Generic table for scripts that declare sampling without a recognized
/// sampling mode.
pub const SAMPLING_DEFAULTS: SamplingSettings = SamplingSettings {
    size: 5,
    average_pause: 0.2,
    pause_variance: 0.1,
    error_budget: 4,
    warning_threshold: 0.9,
};

pub fn defaults_for(mode: Mode) -> SamplingSettings {
    match mode {
        Mode::Acceptance => ACCEPTANCE_DEFAULTS,
        Mode::Monitoring => MONITORING_DEFAULTS,
        Mode::Performance => SAMPLING_DEFAULTS,
    }
}

/// Derive a script whose sampling block is the given defaults overridden
/// field by field by the script's own block, fully populated, and validated
/// before being returned. The input script is never mutated.
pub fn apply_sampling(
    defaults: SamplingSettings,
    script: &Script,
    settings: &Settings,
    diagnostics: &dyn DiagnosticSink,
) -> Result<Script, TaskError> {
    let resolved = defaults.with_overrides(script.sampling.as_ref());

    let mut applied = script.clone();
    applied.sampling = Some(resolved.as_overrides());

    let mut effective = settings.clone();
    effective.sampling = resolved;
    validator::validate_sampling_script(&effective, &applied, diagnostics)?;

    Ok(applied)
}

pub fn apply_acceptance_sampling(
    script: &Script,
    settings: &Settings,
    diagnostics: &dyn DiagnosticSink,
) -> Result<Script, TaskError> {
    apply_sampling(ACCEPTANCE_DEFAULTS, script, settings, diagnostics)
}

pub fn apply_monitoring_sampling(
    script: &Script,
    settings: &Settings,
    diagnostics: &dyn DiagnosticSink,
) -> Result<Script, TaskError> {
    apply_sampling(MONITORING_DEFAULTS, script, settings, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::testing::CollectingDiagnostics;
    use crate::domain::Sampling;

    fn acceptance_script() -> Script {
        Script {
            mode: Some("acceptance".to_string()),
            ..Script::default()
        }
    }

    #[test]
    fn test_defaults_tables_by_mode() {
        assert_eq!(defaults_for(Mode::Acceptance).size, 1);
        assert_eq!(defaults_for(Mode::Acceptance).error_budget, 0);
        assert_eq!(defaults_for(Mode::Monitoring).size, 5);
        assert_eq!(defaults_for(Mode::Monitoring).error_budget, 4);
        assert_eq!(defaults_for(Mode::Performance).warning_threshold, 0.9);
    }

    #[test]
    fn test_apply_populates_every_field() {
        let script = acceptance_script();
        let settings = Settings::resolve(&script).unwrap();
        let diagnostics = CollectingDiagnostics::default();
        let applied = apply_acceptance_sampling(&script, &settings, &diagnostics).unwrap();

        let block = applied.sampling.unwrap();
        assert_eq!(block.size, Some(1));
        assert_eq!(block.average_pause, Some(0.2));
        assert_eq!(block.pause_variance, Some(0.1));
        assert_eq!(block.error_budget, Some(0));
        assert_eq!(block.warning_threshold, Some(0.9));
    }

    #[test]
    fn test_apply_honors_partial_overrides() {
        let script = Script {
            sampling: Some(Sampling {
                size: Some(3),
                ..Sampling::default()
            }),
            ..acceptance_script()
        };
        let settings = Settings::resolve(&script).unwrap();
        let diagnostics = CollectingDiagnostics::default();
        let applied = apply_acceptance_sampling(&script, &settings, &diagnostics).unwrap();

        let block = applied.sampling.unwrap();
        assert_eq!(block.size, Some(3));
        assert_eq!(block.average_pause, Some(0.2));
    }

    #[test]
    fn test_apply_never_mutates_the_input() {
        let script = acceptance_script();
        let settings = Settings::resolve(&script).unwrap();
        let diagnostics = CollectingDiagnostics::default();
        apply_acceptance_sampling(&script, &settings, &diagnostics).unwrap();
        assert!(script.sampling.is_none());
    }

    #[test]
    fn test_apply_validates_the_resolved_block() {
        // a variance override exceeding the default pause must be rejected
        let script = Script {
            sampling: Some(Sampling {
                pause_variance: Some(0.5),
                ..Sampling::default()
            }),
            ..acceptance_script()
        };
        let settings = Settings::resolve(&script).unwrap();
        let diagnostics = CollectingDiagnostics::default();
        assert!(apply_acceptance_sampling(&script, &settings, &diagnostics).is_err());
    }

    #[test]
    fn test_monitoring_defaults_leave_budget_exercisable() {
        // 5 samples against a budget of 4: the tightest configuration the
        // monitoring defaults allow
        let script = Script {
            mode: Some("monitoring".to_string()),
            ..Script::default()
        };
        let settings = Settings::resolve(&script).unwrap();
        let diagnostics = CollectingDiagnostics::default();
        assert!(apply_monitoring_sampling(&script, &settings, &diagnostics).is_ok());
    }
}
