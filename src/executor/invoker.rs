//! The invocation primitive: wait a computed delay, then run one plan to a
//! report. Two implementations of the same seam exist, selected by
//! configuration at construction time: a real worker spawn and an
//! in-process loopback that recurses into the top-level handling logic.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time::Duration;
use tracing::debug;

use super::{LoadEngine, TaskRunner};
use crate::alert::AlertSink;
use crate::config::AlertFailurePolicy;
use crate::diagnostics::DiagnosticSink;
use crate::domain::{InvocationKind, Plan, Report};
use crate::error::TaskError;

/// Worker-spawn collaborator: starts a new worker instance carrying one
/// plan's payload and resolves with the worker's report.
#[async_trait]
pub trait WorkerSpawner: Send + Sync {
    async fn spawn(&self, plan: &Plan, kind: InvocationKind) -> Result<Report>;
}

/// One branch of the fan-out: wait, then run the plan to completion. The
/// branch settles only once the underlying invocation does, regardless of
/// whether the requested kind is synchronous or fire-and-forget from the
/// spawn collaborator's own perspective.
#[async_trait]
pub trait SelfInvoker: Send + Sync {
    async fn invoke(&self, delay_ms: i64, plan: Plan) -> Result<Report, TaskError>;
}

pub(crate) async fn delay(ms: i64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms as u64)).await;
    }
}

/// Standard configuration: each plan is handed to the worker-spawn
/// collaborator after its delay.
pub struct SpawnInvoker {
    spawner: Arc<dyn WorkerSpawner>,
}

impl SpawnInvoker {
    pub fn new(spawner: Arc<dyn WorkerSpawner>) -> Self {
        Self { spawner }
    }
}

#[async_trait]
impl SelfInvoker for SpawnInvoker {
    async fn invoke(&self, delay_ms: i64, plan: Plan) -> Result<Report, TaskError> {
        if plan.script.trace {
            debug!(
                genesis = %plan.genesis,
                start = plan.start,
                delay_ms,
                "scheduling self invocation"
            );
        }
        delay(delay_ms).await;
        if plan.script.trace {
            debug!(genesis = %plan.genesis, start = plan.start, "invoking worker");
        }
        let report = self
            .spawner
            .spawn(&plan, plan.invocation)
            .await
            .map_err(|e| {
                TaskError::Execution(format!(
                    "worker invocation for {} failed: {}",
                    plan.genesis, e
                ))
            })?;
        if plan.script.trace {
            debug!(genesis = %plan.genesis, start = plan.start, "invoke complete");
        }
        Ok(report)
    }
}

/// Diagnostic/simulation configuration: recurse into a fresh runner
/// in-process instead of paying for a real worker spawn. Exercises the
/// whole distribution logic, including re-planning of the fragment.
#[derive(Clone)]
pub struct LoopbackInvoker {
    engine: Arc<dyn LoadEngine>,
    alert: Arc<dyn AlertSink>,
    diagnostics: Arc<dyn DiagnosticSink>,
    alert_failure_policy: AlertFailurePolicy,
    max_concurrent_invocations: Option<usize>,
}

impl LoopbackInvoker {
    pub fn new(
        engine: Arc<dyn LoadEngine>,
        alert: Arc<dyn AlertSink>,
        diagnostics: Arc<dyn DiagnosticSink>,
        alert_failure_policy: AlertFailurePolicy,
        max_concurrent_invocations: Option<usize>,
    ) -> Self {
        Self {
            engine,
            alert,
            diagnostics,
            alert_failure_policy,
            max_concurrent_invocations,
        }
    }
}

#[async_trait]
impl SelfInvoker for LoopbackInvoker {
    async fn invoke(&self, delay_ms: i64, plan: Plan) -> Result<Report, TaskError> {
        delay(delay_ms).await;
        debug!(genesis = %plan.genesis, start = plan.start, "simulation: self invocation");
        let runner = TaskRunner::with_invoker(
            self.engine.clone(),
            Arc::new(self.clone()),
            self.alert.clone(),
            self.diagnostics.clone(),
            self.alert_failure_policy,
            self.max_concurrent_invocations,
        );
        let result = Box::pin(runner.handle(plan.script)).await?;
        Ok(result.report)
    }
}
