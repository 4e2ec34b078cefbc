use serde::Serialize;
use tracing::warn;

/// Structured advisory events. These never fail a run; they exist so an
/// operator can spot marginal configurations before they become hard
/// failures in practice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DiagnosticEvent {
    /// The worst-case total pause time of a sampling configuration is close
    /// to the maximum allowed script duration.
    SamplingDurationRisk {
        size: u32,
        scenario_count: usize,
        total_samples: u64,
        average_pause: f64,
        pause_variance: f64,
        max_script_duration_in_seconds: u64,
        warning_threshold: f64,
        worst_case_pause_in_seconds: f64,
        threshold_in_seconds: f64,
    },
}

/// Injectable observer for advisory diagnostics, decoupled from any
/// specific transport.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, event: &DiagnosticEvent);
}

/// Default sink: structured warnings through tracing.
#[derive(Debug, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn emit(&self, event: &DiagnosticEvent) {
        match event {
            DiagnosticEvent::SamplingDurationRisk {
                size,
                scenario_count,
                total_samples,
                average_pause,
                pause_variance,
                max_script_duration_in_seconds,
                warning_threshold,
                worst_case_pause_in_seconds,
                threshold_in_seconds,
            } => {
                warn!(
                    size = *size,
                    scenario_count = *scenario_count,
                    total_samples = *total_samples,
                    average_pause = *average_pause,
                    pause_variance = *pause_variance,
                    max_script_duration_in_seconds = *max_script_duration_in_seconds,
                    warning_threshold = *warning_threshold,
                    worst_case_pause_in_seconds = *worst_case_pause_in_seconds,
                    threshold_in_seconds = *threshold_in_seconds,
                    "sampling could exceed the duration allowed for executing it; \
                     continuous sampling in this configuration can also cost more than expected"
                );
            }
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::{DiagnosticEvent, DiagnosticSink};

    /// Test sink that records every emitted event.
    #[derive(Debug, Default)]
    pub struct CollectingDiagnostics {
        pub events: Mutex<Vec<DiagnosticEvent>>,
    }

    impl DiagnosticSink for CollectingDiagnostics {
        fn emit(&self, event: &DiagnosticEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }
}
