use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::domain::{Script, TestResult};

/// Alert collaborator for monitoring mode, invoked when the error budget is
/// exceeded. Deployments wire their own transport (pager, queue, webhook)
/// behind this trait.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, script: &Script, result: &TestResult) -> Result<()>;
}

/// Default sink: renders the breach as a structured warning.
#[derive(Debug, Default)]
pub struct TracingAlertSink;

#[async_trait]
impl AlertSink for TracingAlertSink {
    async fn send(&self, script: &Script, result: &TestResult) -> Result<()> {
        warn!(
            genesis = %result.genesis,
            mode = ?script.mode,
            errors = result.report.total_errors(),
            requests_completed = result.report.requests_completed,
            "monitoring error budget exceeded"
        );
        Ok(())
    }
}
