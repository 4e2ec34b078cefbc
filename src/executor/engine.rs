use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;

use crate::domain::{Plan, Report};

/// The load-generation engine: turns one plan into a raw report. Treated
/// as an opaque black box that may fail.
#[async_trait]
pub trait LoadEngine: Send + Sync {
    async fn run(&self, plan: &Plan) -> Result<Report>;
}

/// Engine stand-in that synthesizes plausible reports without generating
/// any load. Used by the dry-run binary and by tests exercising the
/// scheduling pipeline.
#[derive(Debug, Clone)]
pub struct SimulatedEngine {
    pub base_latency_ms: f64,
    pub jitter_ms: f64,
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self {
            base_latency_ms: 18.0,
            jitter_ms: 40.0,
        }
    }
}

impl SimulatedEngine {
    /// Requests a plan would issue: phased load where phases exist, one
    /// pass through each carried scenario otherwise (the one-shot sample
    /// case).
    fn expected_requests(plan: &Plan) -> u64 {
        let phased: u64 = plan
            .script
            .config
            .phases
            .iter()
            .map(|p| p.duration_in_seconds * p.requests_per_second)
            .sum();
        if phased > 0 {
            phased
        } else {
            plan.script.scenario_count() as u64
        }
    }
}

#[async_trait]
impl LoadEngine for SimulatedEngine {
    async fn run(&self, plan: &Plan) -> Result<Report> {
        let requests = Self::expected_requests(plan);
        let mut rng = rand::thread_rng();
        // latency sampling is capped so huge scripts do not balloon reports
        let samples = requests.min(1_000);
        let latency_ms = (0..samples)
            .map(|_| self.base_latency_ms + rng.gen::<f64>() * self.jitter_ms)
            .collect();

        let mut report = Report {
            requests_completed: requests,
            latency_ms,
            ..Report::default()
        };
        report.codes.insert(200, requests);
        Ok(report)
    }
}
