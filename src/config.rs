use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub executor: ExecutorConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutorConfig {
    /// Route fan-out through the in-process loopback instead of real worker
    /// spawns. Used to exercise the distribution logic without paying for
    /// spawns.
    #[serde(default)]
    pub simulation: bool,
    /// Optional ceiling on in-flight plan invocations. Unset means every
    /// plan is dispatched as soon as its own delay elapses. Capping trades
    /// schedule fidelity for a bounded load on the spawn collaborator.
    #[serde(default)]
    pub max_concurrent_invocations: Option<usize>,
    /// What to do when monitoring's alert dispatch itself fails.
    #[serde(default)]
    pub alert_failure_policy: AlertFailurePolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertFailurePolicy {
    /// Log the failure and return the monitoring result unaltered.
    #[default]
    Swallow,
    /// Fail the whole monitoring invocation.
    Propagate,
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("SURGE__").split("__"));
        Ok(figment.extract()?)
    }
}
