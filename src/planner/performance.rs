//! Performance planning: groups contiguous phases into time chunks that fit
//! the chunk duration ceiling, splitting oversized phases at chunk
//! boundaries, then splits any chunk whose peak rate exceeds the chunk rate
//! ceiling into parallel width lanes whose rates sum to the original.

use uuid::Uuid;

use crate::domain::{InvocationKind, Phase, Plan, Script, Settings};

/// Plan a performance script. Concatenating the produced plans' phase
/// content reproduces the original phase sequence with contiguous,
/// non-overlapping time coverage; width lanes partition the rate of their
/// chunk. The first plan is marked for synchronous execution, the rest for
/// spawned, delayed execution.
pub fn plan_performance(time_now: i64, script: &Script, settings: &Settings) -> Vec<Plan> {
    let genesis = script.genesis.unwrap_or_else(Uuid::new_v4);
    let chunks = split_phases_by_duration(
        &script.config.phases,
        settings.max_chunk_duration_in_seconds,
    );

    let mut plans = Vec::new();
    for (offset_in_seconds, chunk) in chunks {
        let start = time_now + offset_in_seconds as i64 * 1_000;
        for lane in split_chunk_by_width(&chunk, settings.max_chunk_requests_per_second) {
            let mut fragment = script.clone();
            fragment.config.phases = lane;
            let invocation = if plans.is_empty() {
                InvocationKind::RequestResponse
            } else {
                InvocationKind::Event
            };
            plans.push(Plan::new(fragment, start, invocation, genesis));
        }
    }
    plans
}

/// Walk the phase sequence grouping contiguous phases into chunks of at
/// most `cap` seconds. A phase longer than the remaining capacity is split
/// at the boundary; the tail continues in the next chunk. Returns each
/// chunk with its offset from the script start.
fn split_phases_by_duration(phases: &[Phase], cap: u64) -> Vec<(u64, Vec<Phase>)> {
    let mut chunks = Vec::new();
    let mut current: Vec<Phase> = Vec::new();
    let mut used = 0u64;
    let mut offset = 0u64;

    for phase in phases {
        let mut remaining = phase.duration_in_seconds;
        while remaining > 0 {
            if used == cap {
                chunks.push((offset, std::mem::take(&mut current)));
                offset += used;
                used = 0;
            }
            let take = remaining.min(cap - used);
            current.push(Phase {
                duration_in_seconds: take,
                ..phase.clone()
            });
            used += take;
            remaining -= take;
        }
    }
    if !current.is_empty() {
        chunks.push((offset, current));
    }
    chunks
}

/// Split a chunk whose peak rate exceeds `cap` into parallel lanes. Each
/// phase's rate is divided as evenly as the integers allow; lanes cover the
/// same time window, so a lane's share of a low-rate phase can be an idle
/// gap.
fn split_chunk_by_width(phases: &[Phase], cap: u64) -> Vec<Vec<Phase>> {
    let peak = phases
        .iter()
        .map(|phase| phase.requests_per_second)
        .max()
        .unwrap_or(0);
    if peak <= cap {
        return vec![phases.to_vec()];
    }

    let lanes = peak.div_ceil(cap) as usize;
    (0..lanes)
        .map(|lane| {
            phases
                .iter()
                .map(|phase| {
                    let base = phase.requests_per_second / lanes as u64;
                    let remainder = (phase.requests_per_second % lanes as u64) as usize;
                    Phase {
                        requests_per_second: base + u64::from(lane < remainder),
                        ..phase.clone()
                    }
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScriptConfig;
    use proptest::prelude::*;

    fn phase(duration: u64, rate: u64) -> Phase {
        Phase {
            name: None,
            duration_in_seconds: duration,
            requests_per_second: rate,
        }
    }

    fn script(phases: Vec<Phase>) -> Script {
        Script {
            config: ScriptConfig { phases },
            ..Script::default()
        }
    }

    fn settings(chunk_duration: u64, chunk_rps: u64) -> Settings {
        let mut settings = Settings::resolve(&Script::default()).unwrap();
        settings.max_chunk_duration_in_seconds = chunk_duration;
        settings.max_chunk_requests_per_second = chunk_rps;
        settings
    }

    #[test]
    fn test_script_fitting_one_chunk_yields_one_synchronous_plan() {
        let plans = plan_performance(0, &script(vec![phase(60, 10)]), &settings(240, 25));
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].invocation, InvocationKind::RequestResponse);
        assert_eq!(plans[0].start, Some(0));
    }

    #[test]
    fn test_oversized_phase_is_subdivided() {
        let plans = plan_performance(0, &script(vec![phase(600, 10)]), &settings(240, 25));
        assert_eq!(plans.len(), 3);
        let durations: Vec<u64> = plans
            .iter()
            .map(|p| p.script.config.phases[0].duration_in_seconds)
            .collect();
        assert_eq!(durations, vec![240, 240, 120]);
    }

    #[test]
    fn test_chunk_starts_are_cumulative() {
        let time_now = 1_000_000;
        let plans = plan_performance(time_now, &script(vec![phase(600, 10)]), &settings(240, 25));
        let starts: Vec<i64> = plans.iter().map(|p| p.start.unwrap()).collect();
        assert_eq!(
            starts,
            vec![time_now, time_now + 240_000, time_now + 480_000]
        );
    }

    #[test]
    fn test_contiguous_phases_group_into_one_chunk() {
        let plans = plan_performance(
            0,
            &script(vec![phase(100, 10), phase(100, 20), phase(40, 5)]),
            &settings(240, 25),
        );
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].script.config.phases.len(), 3);
    }

    #[test]
    fn test_phase_split_at_chunk_boundary_preserves_sequence() {
        let plans = plan_performance(
            0,
            &script(vec![phase(200, 10), phase(100, 20)]),
            &settings(240, 25),
        );
        assert_eq!(plans.len(), 2);
        // first chunk: all of phase one plus the head of phase two
        let first: Vec<(u64, u64)> = plans[0]
            .script
            .config
            .phases
            .iter()
            .map(|p| (p.duration_in_seconds, p.requests_per_second))
            .collect();
        assert_eq!(first, vec![(200, 10), (40, 20)]);
        // second chunk: the tail of phase two
        let second: Vec<(u64, u64)> = plans[1]
            .script
            .config
            .phases
            .iter()
            .map(|p| (p.duration_in_seconds, p.requests_per_second))
            .collect();
        assert_eq!(second, vec![(60, 20)]);
    }

    #[test]
    fn test_wide_chunk_splits_into_lanes_that_sum() {
        let plans = plan_performance(0, &script(vec![phase(60, 60)]), &settings(240, 25));
        assert_eq!(plans.len(), 3);
        let rates: Vec<u64> = plans
            .iter()
            .map(|p| p.script.config.phases[0].requests_per_second)
            .collect();
        assert_eq!(rates.iter().sum::<u64>(), 60);
        assert!(rates.iter().all(|&r| r <= 25));
        // lanes cover the same window
        assert!(plans.iter().all(|p| p.start == Some(0)));
    }

    #[test]
    fn test_lane_share_of_low_rate_phase_can_idle() {
        let plans = plan_performance(
            0,
            &script(vec![phase(60, 30), phase(60, 1)]),
            &settings(240, 25),
        );
        assert_eq!(plans.len(), 2);
        let narrow: Vec<u64> = plans
            .iter()
            .map(|p| p.script.config.phases[1].requests_per_second)
            .collect();
        assert_eq!(narrow.iter().sum::<u64>(), 1);
        assert!(narrow.contains(&0));
    }

    #[test]
    fn test_all_plans_share_one_genesis() {
        let plans = plan_performance(0, &script(vec![phase(600, 10)]), &settings(240, 25));
        let genesis = plans[0].genesis;
        assert!(plans.iter().all(|p| p.genesis == genesis));
        assert!(plans.iter().all(|p| p.script.genesis == Some(genesis)));
    }

    #[test]
    fn test_subsequent_plans_are_marked_for_spawn() {
        let plans = plan_performance(0, &script(vec![phase(600, 10)]), &settings(240, 25));
        assert_eq!(plans[0].invocation, InvocationKind::RequestResponse);
        assert!(plans[1..]
            .iter()
            .all(|p| p.invocation == InvocationKind::Event));
    }

    proptest! {
        /// Duration coverage: per-second rate over the whole script is
        /// reproduced exactly by the union of all plans.
        #[test]
        fn prop_plans_cover_the_script_exactly_once(
            phases in proptest::collection::vec((1u64..400, 1u64..80), 1..6),
            chunk_duration in 15u64..285,
            chunk_rps in 1u64..60,
        ) {
            let phases: Vec<Phase> = phases
                .into_iter()
                .map(|(duration, rate)| phase(duration, rate))
                .collect();
            let total_seconds: u64 = phases.iter().map(|p| p.duration_in_seconds).sum();
            let original = script(phases);
            let plans = plan_performance(0, &original, &settings(chunk_duration, chunk_rps));

            // per-second rate profile of the original script
            let mut expected = vec![0u64; total_seconds as usize];
            let mut cursor = 0usize;
            for p in &original.config.phases {
                for s in 0..p.duration_in_seconds as usize {
                    expected[cursor + s] = p.requests_per_second;
                }
                cursor += p.duration_in_seconds as usize;
            }

            // accumulate every plan's profile at its offset
            let mut actual = vec![0u64; total_seconds as usize];
            for plan in &plans {
                let offset = (plan.start.unwrap() / 1_000) as usize;
                let mut cursor = offset;
                for p in &plan.script.config.phases {
                    for s in 0..p.duration_in_seconds as usize {
                        actual[cursor + s] += p.requests_per_second;
                    }
                    cursor += p.duration_in_seconds as usize;
                }
            }
            prop_assert_eq!(expected, actual);

            // every plan respects the chunk ceilings
            for plan in &plans {
                let duration: u64 = plan.script.config.phases.iter()
                    .map(|p| p.duration_in_seconds)
                    .sum();
                prop_assert!(duration <= chunk_duration);
                let peak = plan.script.config.phases.iter()
                    .map(|p| p.requests_per_second)
                    .max()
                    .unwrap_or(0);
                prop_assert!(peak <= chunk_rps);
            }
        }
    }
}
