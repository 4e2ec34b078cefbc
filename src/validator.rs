//! Pure, stateless rule checking over (settings, script). Every violation
//! is a `TaskError::Configuration` raised before any execution begins; the
//! only side effect is an advisory diagnostic for near-threshold sampling
//! configurations.

use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::domain::{
    Mode, Script, Settings, MAX_CHUNK_DURATION_IN_SECONDS,
    MAX_CHUNK_REQUESTS_PER_SECOND, MAX_SCRIPT_DURATION_IN_SECONDS,
    MAX_SCRIPT_REQUESTS_PER_SECOND, MAX_TIME_BUFFER_IN_MILLISECONDS,
    MIN_CHUNK_DURATION_IN_SECONDS,
};
use crate::error::TaskError;
use crate::planner;

/// Validate a script against the resolved settings, dispatching on its
/// modality.
pub fn validate(
    settings: &Settings,
    script: &Script,
    diagnostics: &dyn DiagnosticSink,
) -> Result<(), TaskError> {
    match script.modality()? {
        Mode::Performance => validate_performance_script(settings, script),
        Mode::Acceptance | Mode::Monitoring => {
            validate_sampling_script(settings, script, diagnostics)
        }
    }
}

/// Reject scripts whose `mode` attribute is not a recognized token.
pub fn validate_script_mode(script: &Script) -> Result<(), TaskError> {
    script.modality().map(|_| ())
}

/// Performance rules: at least one phase, every phase duration valid, and
/// script-level duration and rate inside the script ceilings.
pub fn validate_performance_script(settings: &Settings, script: &Script) -> Result<(), TaskError> {
    if script.config.phases.is_empty() {
        return Err(TaskError::Configuration(
            "A load script must contain at least one phase under the config.phases attribute \
             unless the mode attribute is acceptance, acc, monitoring, or mon"
                .to_string(),
        ));
    }
    let duration = planner::script_duration_in_seconds(script).map_err(|index| {
        TaskError::Configuration(format!(
            "Every phase must have a valid duration in seconds. Offending phase {}: {}",
            index,
            render_phase(script, index)
        ))
    })?;
    if duration > settings.max_script_duration_in_seconds {
        return Err(TaskError::Configuration(format!(
            "The total duration in seconds of all script phases ({}) cannot exceed {}",
            duration, settings.max_script_duration_in_seconds
        )));
    }
    let peak = planner::script_requests_per_second(script);
    if peak == 0 {
        return Err(TaskError::Configuration(
            "Every phase must have a valid means to determine requests per second, and the \
             peak across phases must be greater than zero"
                .to_string(),
        ));
    }
    if peak > settings.max_script_requests_per_second {
        let index = script
            .config
            .phases
            .iter()
            .position(|p| p.requests_per_second == peak)
            .unwrap_or(0);
        return Err(TaskError::Configuration(format!(
            "The maximum requests per second of any script phase cannot exceed {}. \
             Offending phase {}: {}",
            settings.max_script_requests_per_second,
            index,
            render_phase(script, index)
        )));
    }
    Ok(())
}

/// Sampling rules: field ranges, a budget the test can actually exercise,
/// and worst-case pause time inside the duration ceiling. Near-threshold
/// configurations emit an advisory diagnostic instead of failing.
pub fn validate_sampling_script(
    settings: &Settings,
    script: &Script,
    diagnostics: &dyn DiagnosticSink,
) -> Result<(), TaskError> {
    let sampling = &settings.sampling;
    if sampling.size == 0 {
        return Err(TaskError::Configuration(
            "If specified, the sampling size must be greater than zero".to_string(),
        ));
    }
    if !(sampling.average_pause > 0.0) {
        return Err(TaskError::Configuration(
            "If specified, the sampling average_pause must be a number greater than zero"
                .to_string(),
        ));
    }
    if !(sampling.pause_variance >= 0.0) {
        return Err(TaskError::Configuration(
            "If specified, the sampling pause_variance must be a number greater than or equal \
             to zero"
                .to_string(),
        ));
    }
    if !(sampling.warning_threshold > 0.0 && sampling.warning_threshold <= 1.0) {
        return Err(TaskError::Configuration(
            "If specified, the sampling warning_threshold must be either one or between zero \
             and one"
                .to_string(),
        ));
    }

    let scenario_count = script.scenario_count();
    let total_samples = u64::from(sampling.size) * scenario_count as u64;
    if total_samples <= u64::from(sampling.error_budget) {
        return Err(TaskError::Configuration(format!(
            "The given size * scenarios ({}) and error_budget ({}) values (perhaps from \
             defaults) succeed even if all samples fail",
            total_samples, sampling.error_budget
        )));
    }
    if sampling.pause_variance > sampling.average_pause {
        return Err(TaskError::Configuration(format!(
            "The given pause_variance ({}) cannot exceed the given average_pause ({})",
            sampling.pause_variance, sampling.average_pause
        )));
    }

    let worst_case_pause =
        (sampling.average_pause + sampling.pause_variance) * total_samples as f64;
    let ceiling = settings.max_script_duration_in_seconds as f64;
    if worst_case_pause > ceiling {
        return Err(TaskError::Configuration(format!(
            "The given average_pause ({}), pause_variance ({}), and size * scenarios ({}) \
             values in combination could, even ignoring request duration, exceed the maximum \
             allowable duration ({})",
            sampling.average_pause,
            sampling.pause_variance,
            total_samples,
            settings.max_script_duration_in_seconds
        )));
    }
    let threshold = ceiling * sampling.warning_threshold;
    if worst_case_pause > threshold {
        diagnostics.emit(&DiagnosticEvent::SamplingDurationRisk {
            size: sampling.size,
            scenario_count,
            total_samples,
            average_pause: sampling.average_pause,
            pause_variance: sampling.pause_variance,
            max_script_duration_in_seconds: settings.max_script_duration_in_seconds,
            warning_threshold: sampling.warning_threshold,
            worst_case_pause_in_seconds: worst_case_pause,
            threshold_in_seconds: threshold,
        });
    }
    Ok(())
}

/// Bound checks over the user-supplied split overrides. Values arrive as
/// unsigned integers by construction; each must sit inside its documented
/// inclusive bound.
pub fn validate_settings(script: &Script) -> Result<(), TaskError> {
    let Some(split) = &script.split else {
        return Ok(());
    };
    check_bounded_setting(
        "max_chunk_duration_in_seconds",
        split.max_chunk_duration_in_seconds,
        MIN_CHUNK_DURATION_IN_SECONDS,
        MAX_CHUNK_DURATION_IN_SECONDS,
    )?;
    check_bounded_setting(
        "max_script_duration_in_seconds",
        split.max_script_duration_in_seconds,
        1,
        MAX_SCRIPT_DURATION_IN_SECONDS,
    )?;
    check_bounded_setting(
        "max_chunk_requests_per_second",
        split.max_chunk_requests_per_second,
        1,
        MAX_CHUNK_REQUESTS_PER_SECOND,
    )?;
    check_bounded_setting(
        "max_script_requests_per_second",
        split.max_script_requests_per_second,
        1,
        MAX_SCRIPT_REQUESTS_PER_SECOND,
    )?;
    check_bounded_setting(
        "time_buffer_in_milliseconds",
        split.time_buffer_in_milliseconds,
        1,
        MAX_TIME_BUFFER_IN_MILLISECONDS,
    )
}

fn check_bounded_setting(
    name: &str,
    value: Option<u64>,
    minimum: u64,
    maximum: u64,
) -> Result<(), TaskError> {
    if let Some(value) = value {
        if value < minimum || value > maximum {
            return Err(TaskError::Configuration(format!(
                "If specified, the split.{} attribute must be an integer inclusively between \
                 {} and {}.",
                name, minimum, maximum
            )));
        }
    }
    Ok(())
}

fn render_phase(script: &Script, index: usize) -> String {
    script
        .config
        .phases
        .get(index)
        .and_then(|p| serde_json::to_string(p).ok())
        .unwrap_or_else(|| "<unrenderable phase>".to_string())
}
