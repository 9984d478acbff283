//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_pipeline;
pub use validate::run_validate;

use anyhow::{Context, Result};
use contracts::OutputBlueprint;
use std::path::Path;

/// Load a configuration file, failing early when it does not exist
pub(crate) fn load_blueprint(path: &Path) -> Result<OutputBlueprint> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }
    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Outcome of one syslog reachability probe
#[derive(Debug, serde::Serialize)]
pub(crate) struct ProbeOutcome {
    pub sink: String,
    pub endpoint: String,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Try one connection to every enabled syslog collector, without retrying
pub(crate) async fn probe_syslog_sinks(blueprint: &OutputBlueprint) -> Vec<ProbeOutcome> {
    let mut outcomes = Vec::new();
    for sink in blueprint
        .sinks
        .iter()
        .filter(|s| s.kind == contracts::SinkKind::Syslog && s.mode.is_enabled())
    {
        let result = dispatcher::SyslogSink::probe(sink).await;
        outcomes.push(ProbeOutcome {
            sink: sink.name.clone(),
            endpoint: sink.endpoint.clone().unwrap_or_default(),
            reachable: result.is_ok(),
            error: result.err().map(|e| e.to_string()),
        });
    }
    outcomes
}
