use anyhow::Result;
use std::sync::Arc;
use surge_conductor::alert::TracingAlertSink;
use surge_conductor::config::Config;
use surge_conductor::domain::Script;
use surge_conductor::executor::{SimulatedEngine, TaskRunner};
use surge_conductor::telemetry::init_tracing;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: surge-conductor <script.yml>"))?;
    let raw = std::fs::read_to_string(&path)?;
    let script: Script = serde_yaml::from_str(&raw)?;

    let cfg = Config::load()?;
    if !cfg.executor.simulation {
        anyhow::bail!(
            "this binary only wires the simulation invoker; set executor.simulation = true, \
             or embed the library with a real WorkerSpawner"
        );
    }

    let runner = TaskRunner::simulation(
        Arc::new(SimulatedEngine::default()),
        Arc::new(TracingAlertSink),
        &cfg,
    );
    let result = runner.handle(script).await?;

    info!(
        genesis = %result.genesis,
        requests_completed = result.report.requests_completed,
        errors = result.report.total_errors(),
        passed = ?result.passed,
        "execution complete"
    );
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
