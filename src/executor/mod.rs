//! The scheduling core: decides in-process vs fan-out execution per plan
//! count, honors each plan's absolute start time, and joins the fan-out
//! with an all-or-nothing barrier.

pub mod engine;
pub mod invoker;

pub use engine::{LoadEngine, SimulatedEngine};
pub use invoker::{LoopbackInvoker, SelfInvoker, SpawnInvoker, WorkerSpawner};

use std::sync::Arc;

use chrono::Utc;
use futures::future;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::aggregator;
use crate::alert::AlertSink;
use crate::analyzer;
use crate::config::{AlertFailurePolicy, Config};
use crate::diagnostics::{DiagnosticSink, TracingDiagnostics};
use crate::domain::{Mode, Plan, Report, Script, Settings, TestResult};
use crate::error::TaskError;
use crate::planner;
use crate::sampling;
use crate::validator;

pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Top-level handler for one script execution: validates, plans, runs the
/// plans in this process or distributed across workers, and analyzes the
/// merged result per the script's mode.
pub struct TaskRunner {
    engine: Arc<dyn LoadEngine>,
    invoker: Arc<dyn SelfInvoker>,
    alert: Arc<dyn AlertSink>,
    diagnostics: Arc<dyn DiagnosticSink>,
    alert_failure_policy: AlertFailurePolicy,
    max_concurrent_invocations: Option<usize>,
}

impl TaskRunner {
    /// Standard configuration: fan-out goes through the given worker-spawn
    /// collaborator.
    pub fn new(
        engine: Arc<dyn LoadEngine>,
        spawner: Arc<dyn WorkerSpawner>,
        alert: Arc<dyn AlertSink>,
        config: &Config,
    ) -> Self {
        Self::with_invoker(
            engine,
            Arc::new(SpawnInvoker::new(spawner)),
            alert,
            Arc::new(TracingDiagnostics),
            config.executor.alert_failure_policy,
            config.executor.max_concurrent_invocations,
        )
    }

    /// Simulation configuration: fan-out recurses in-process through the
    /// loopback invoker.
    pub fn simulation(
        engine: Arc<dyn LoadEngine>,
        alert: Arc<dyn AlertSink>,
        config: &Config,
    ) -> Self {
        let diagnostics: Arc<dyn DiagnosticSink> = Arc::new(TracingDiagnostics);
        let invoker = Arc::new(LoopbackInvoker::new(
            engine.clone(),
            alert.clone(),
            diagnostics.clone(),
            config.executor.alert_failure_policy,
            config.executor.max_concurrent_invocations,
        ));
        Self::with_invoker(
            engine,
            invoker,
            alert,
            diagnostics,
            config.executor.alert_failure_policy,
            config.executor.max_concurrent_invocations,
        )
    }

    pub fn with_invoker(
        engine: Arc<dyn LoadEngine>,
        invoker: Arc<dyn SelfInvoker>,
        alert: Arc<dyn AlertSink>,
        diagnostics: Arc<dyn DiagnosticSink>,
        alert_failure_policy: AlertFailurePolicy,
        max_concurrent_invocations: Option<usize>,
    ) -> Self {
        Self {
            engine,
            invoker,
            alert,
            diagnostics,
            alert_failure_policy,
            max_concurrent_invocations,
        }
    }

    /// Handle one script execution end to end.
    pub async fn handle(&self, mut script: Script) -> Result<TestResult, TaskError> {
        let time_now = now_ms();
        // lineage is never user-authored: a script arriving without a
        // genesis id is the origin of the execution, delegated fragments
        // already carry one
        let is_origin = script.genesis.is_none();
        script.genesis.get_or_insert_with(Uuid::new_v4);

        validator::validate_settings(&script)?;
        let mode = script.modality()?;
        let settings = Settings::resolve(&script)?;

        if script.trace {
            info!(genesis = ?script.genesis, mode = %mode, time_now, "handling load script");
        }

        match mode {
            Mode::Performance => self.run_performance(time_now, script, settings).await,
            Mode::Acceptance => self.run_acceptance(time_now, script, settings).await,
            Mode::Monitoring => {
                self.run_monitoring(time_now, script, settings, is_origin)
                    .await
            }
        }
    }

    async fn run_performance(
        &self,
        time_now: i64,
        script: Script,
        settings: Settings,
    ) -> Result<TestResult, TaskError> {
        validator::validate(&settings, &script, self.diagnostics.as_ref())?;
        let plans = planner::plan_performance(time_now, &script, &settings);
        let result = self.execute_all(time_now, &script, &settings, plans).await?;
        Ok(analyzer::analyze_performance(result))
    }

    async fn run_acceptance(
        &self,
        time_now: i64,
        script: Script,
        settings: Settings,
    ) -> Result<TestResult, TaskError> {
        let acceptance =
            sampling::apply_acceptance_sampling(&script, &settings, self.diagnostics.as_ref())?;
        let plans = planner::plan_samples(time_now, &acceptance, &settings);
        let result = self
            .execute_all(time_now, &acceptance, &settings, plans)
            .await?;
        Ok(analyzer::analyze_acceptance(result, &settings.sampling))
    }

    /// Alert dispatch belongs to the origin invocation: delegated fragments
    /// report their raw observations upward instead of paging per sample.
    async fn run_monitoring(
        &self,
        time_now: i64,
        script: Script,
        settings: Settings,
        is_origin: bool,
    ) -> Result<TestResult, TaskError> {
        let monitoring =
            sampling::apply_monitoring_sampling(&script, &settings, self.diagnostics.as_ref())?;
        let plans = planner::plan_samples(time_now, &monitoring, &settings);
        let result = self
            .execute_all(time_now, &monitoring, &settings, plans)
            .await?;
        let result = analyzer::analyze_monitoring(result, &settings.sampling);

        if result.errors && is_origin {
            if let Err(e) = self.alert.send(&script, &result).await {
                match self.alert_failure_policy {
                    AlertFailurePolicy::Swallow => {
                        warn!(genesis = %result.genesis, error = %e, "alert dispatch failed");
                    }
                    AlertFailurePolicy::Propagate => {
                        return Err(TaskError::Execution(format!(
                            "alert dispatch for {} failed: {}",
                            result.genesis, e
                        )));
                    }
                }
            }
        }
        Ok(result)
    }

    /// Dispatch on plan count: zero is a structural failure, one runs in
    /// this process, more fan out across workers.
    pub async fn execute_all(
        &self,
        time_now: i64,
        script: &Script,
        settings: &Settings,
        mut plans: Vec<Plan>,
    ) -> Result<TestResult, TaskError> {
        match plans.len() {
            0 => {
                let rendered = serde_json::to_string(script)
                    .unwrap_or_else(|_| "<unrenderable script>".to_string());
                error!(script = %rendered, "no executable content");
                Err(TaskError::Structural(format!(
                    "no executable content in:\n{}",
                    rendered
                )))
            }
            1 => {
                let plan = plans.remove(0);
                self.execute(time_now, script, settings, plan).await
            }
            _ => self.distribute(time_now, script, settings, plans).await,
        }
    }

    /// Execute a single plan in this process, honoring its scheduled start.
    /// Failures are logged with full lineage context and re-raised; this
    /// path never swallows one.
    async fn execute(
        &self,
        time_now: i64,
        source: &Script,
        settings: &Settings,
        mut plan: Plan,
    ) -> Result<TestResult, TaskError> {
        if plan.start.is_none() {
            plan.start = Some(time_now);
            plan.script.start = Some(time_now);
        }
        let wait = plan.start.unwrap_or(time_now) - now_ms();
        invoker::delay(wait).await;

        if plan.script.trace {
            info!(genesis = %plan.genesis, time_now, "executing load script");
        }
        match self.engine.run(&plan).await {
            Ok(report) => {
                if plan.script.trace {
                    info!(genesis = %plan.genesis, time_now, "execution complete");
                }
                aggregator::merge(time_now, source, settings, &[report])
            }
            Err(e) => {
                error!(
                    genesis = %plan.genesis,
                    time_now,
                    start = plan.start,
                    error = %e,
                    "error executing load script"
                );
                Err(TaskError::Execution(format!(
                    "load execution for {} failed: {}",
                    plan.genesis, e
                )))
            }
        }
    }

    /// Fan a plan set out across workers. Every plan is dispatched through
    /// the invocation primitive after its own computed delay; the join is
    /// an all-or-nothing barrier, so the first failure fails the whole
    /// execution and no partial result is produced.
    async fn distribute(
        &self,
        time_now: i64,
        script: &Script,
        settings: &Settings,
        plans: Vec<Plan>,
    ) -> Result<TestResult, TaskError> {
        if script.trace {
            info!(
                genesis = ?script.genesis,
                plans = plans.len(),
                time_now,
                "distributing plans"
            );
        }
        let time_buffer = settings.time_buffer_in_milliseconds as i64;
        let trace = script.trace;

        let invocations: Vec<_> = plans
            .into_iter()
            .map(|plan| {
                let invoker = self.invoker.clone();
                async move {
                    let genesis = plan.genesis;
                    // the buffer compensates for spawn latency so execution
                    // begins as close as possible to the intended start
                    let delay_ms =
                        (plan.start.unwrap_or(time_now) - now_ms() - time_buffer).max(0);
                    let report = invoker.invoke(delay_ms, plan).await?;
                    if trace {
                        info!(genesis = %genesis, time_now, "load test partially complete");
                    }
                    Ok::<Report, TaskError>(report)
                }
            })
            .collect();

        let reports: Vec<Report> = match self.max_concurrent_invocations {
            Some(cap) => {
                stream::iter(invocations)
                    .buffered(cap.max(1))
                    .try_collect()
                    .await?
            }
            None => future::try_join_all(invocations).await?,
        };

        if script.trace {
            info!(genesis = ?script.genesis, time_now, "load test completed");
        }
        aggregator::merge(time_now, script, settings, &reports)
    }
}
