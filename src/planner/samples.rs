//! Sample planning: one-shot plans for acceptance and monitoring scripts,
//! spaced by pauses drawn from the configured envelope.

use rand::Rng;
use uuid::Uuid;

use crate::domain::{InvocationKind, Plan, SamplingSettings, Script, Settings};

/// Plan a sampling script: `size` independent one-shot plans per scenario,
/// each carrying exactly its scenario. Successive plans are spaced by a
/// pause drawn uniformly from the closed interval
/// `[average_pause - pause_variance, average_pause + pause_variance]`, so
/// start times never decrease from `time_now`. Every plan shares one
/// lineage id.
///
/// Each fragment's sampling block is rewritten to a single sample with a
/// zero budget, so a worker handling the fragment executes exactly one
/// shot instead of re-expanding the parent's sample set.
pub fn plan_samples(time_now: i64, script: &Script, settings: &Settings) -> Vec<Plan> {
    let genesis = script.genesis.unwrap_or_else(Uuid::new_v4);
    let sampling = settings.sampling;
    let low = (sampling.average_pause - sampling.pause_variance).max(0.0);
    let high = sampling.average_pause + sampling.pause_variance;
    let one_shot = SamplingSettings {
        size: 1,
        error_budget: 0,
        ..sampling
    };

    let mut rng = rand::thread_rng();
    let mut cursor = time_now;
    let mut plans = Vec::new();

    // a script without explicit scenarios still samples as one flow
    let lanes: Vec<Option<usize>> = if script.scenarios.is_empty() {
        vec![None]
    } else {
        (0..script.scenarios.len()).map(Some).collect()
    };

    for lane in lanes {
        for _ in 0..sampling.size {
            if !plans.is_empty() {
                let pause_seconds: f64 = rng.gen_range(low..=high);
                cursor += (pause_seconds * 1_000.0).round() as i64;
            }
            let mut fragment = script.clone();
            fragment.sampling = Some(one_shot.as_overrides());
            if let Some(index) = lane {
                fragment.scenarios = vec![script.scenarios[index].clone()];
            }
            let invocation = if plans.is_empty() {
                InvocationKind::RequestResponse
            } else {
                InvocationKind::Event
            };
            plans.push(Plan::new(fragment, cursor, invocation, genesis));
        }
    }
    plans
}
