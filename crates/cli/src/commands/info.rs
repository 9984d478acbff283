//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::OutputBlueprint;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use super::load_blueprint;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    general: GeneralInfo,
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct GeneralInfo {
    server_name: String,
    result_channel_size: usize,
    print_stats_delay_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    skip_domains_file: Option<PathBuf>,
    skip_domains_refresh_interval_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    allow_domains_file: Option<PathBuf>,
    allow_domains_refresh_interval_secs: u64,
    drain_timeout_secs: u64,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    kind: String,
    mode: String,
    format: String,
    worker_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = load_blueprint(&args.config)?;

    if args.json {
        let info = build_config_info(&blueprint);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{json}");
    } else {
        print_config_info(&blueprint);
    }

    Ok(())
}

fn build_config_info(blueprint: &OutputBlueprint) -> ConfigInfo {
    let general = &blueprint.general;

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        general: GeneralInfo {
            server_name: general.server_name.clone(),
            result_channel_size: general.result_channel_size,
            print_stats_delay_secs: general.print_stats_delay_secs,
            skip_domains_file: general.skip_domains_file.clone(),
            skip_domains_refresh_interval_secs: general.skip_domains_refresh_interval_secs,
            allow_domains_file: general.allow_domains_file.clone(),
            allow_domains_refresh_interval_secs: general.allow_domains_refresh_interval_secs,
            drain_timeout_secs: general.drain_timeout_secs,
        },
        sinks: blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                kind: format!("{:?}", s.kind).to_lowercase(),
                mode: s.mode.to_string(),
                format: format!("{:?}", s.format).to_lowercase(),
                worker_count: s.worker_count,
                endpoint: s.endpoint.clone(),
            })
            .collect(),
    }
}

fn print_config_info(blueprint: &OutputBlueprint) {
    let info = build_config_info(blueprint);
    let general = &info.general;

    println!("=== dnsfanout configuration ({}) ===\n", info.version);

    println!("General");
    println!("   ├─ Server name: {}", general.server_name);
    println!("   ├─ Result channel size: {}", general.result_channel_size);
    println!("   ├─ Stats every: {}s", general.print_stats_delay_secs);
    println!(
        "   ├─ Skip list: {}",
        describe_list(&general.skip_domains_file, general.skip_domains_refresh_interval_secs)
    );
    println!(
        "   ├─ Allow list: {}",
        describe_list(&general.allow_domains_file, general.allow_domains_refresh_interval_secs)
    );
    println!("   └─ Drain timeout: {}s", general.drain_timeout_secs);

    println!("\nSinks ({})", info.sinks.len());
    for (i, sink) in info.sinks.iter().enumerate() {
        let prefix = if i + 1 == info.sinks.len() { "└─" } else { "├─" };
        let target = match sink.endpoint {
            Some(ref endpoint) => endpoint.clone(),
            None => sink.format.clone(),
        };
        println!(
            "   {} {} [{}] {} -> {} ({} workers)",
            prefix, sink.name, sink.mode, sink.kind, target, sink.worker_count
        );
    }

    println!();
}

fn describe_list(file: &Option<PathBuf>, refresh_secs: u64) -> String {
    match file {
        Some(path) if refresh_secs > 0 => {
            format!("{} (reload every {}s)", path.display(), refresh_secs)
        }
        Some(path) => format!("{} (no reload)", path.display()),
        None => "(none)".to_string(),
    }
}
