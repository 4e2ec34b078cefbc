use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::script::Script;

/// How a plan asks to be invoked. The first plan of a script is marked
/// `RequestResponse` (the synchronous wait the in-process path uses);
/// subsequent plans are `Event`, fire-and-forget from the spawn
/// collaborator's perspective. The fan-in barrier waits for every
/// invocation to settle regardless of kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvocationKind {
    RequestResponse,
    Event,
}

/// A schedulable unit of work: a script fragment plus an absolute start
/// time, an invocation kind, and the parent's lineage id. Immutable once
/// produced by the planner; consumed exactly once by the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub script: Script,
    /// Absolute scheduled start, epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    pub invocation: InvocationKind,
    pub genesis: Uuid,
}

impl Plan {
    /// Build a plan, threading the lineage fields into the carried script
    /// so a spawned worker inherits them.
    pub fn new(mut script: Script, start: i64, invocation: InvocationKind, genesis: Uuid) -> Self {
        script.start = Some(start);
        script.genesis = Some(genesis);
        Plan {
            script,
            start: Some(start),
            invocation,
            genesis,
        }
    }
}
