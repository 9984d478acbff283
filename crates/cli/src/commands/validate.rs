//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use super::{probe_syslog_sinks, ProbeOutcome};
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    probes: Vec<ProbeOutcome>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    server_name: String,
    sink_count: usize,
    enabled_sinks: usize,
    skip_list: bool,
    allow_list: bool,
}

impl ValidationResult {
    fn invalid(config_path: String, error: String) -> Self {
        Self {
            valid: false,
            config_path,
            error: Some(error),
            warnings: Vec::new(),
            summary: None,
            probes: Vec::new(),
        }
    }

    fn unreachable(&self) -> usize {
        self.probes.iter().filter(|p| !p.reachable).count()
    }
}

/// Execute the `validate` command
pub async fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args).await;

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    if !result.valid {
        anyhow::bail!("Configuration validation failed");
    }
    if result.unreachable() > 0 {
        anyhow::bail!("{} syslog collector(s) unreachable", result.unreachable());
    }
    Ok(())
}

async fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        let error = format!("File not found: {config_path}");
        return ValidationResult::invalid(config_path, error);
    }

    let blueprint = match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => blueprint,
        Err(e) => return ValidationResult::invalid(config_path, e.to_string()),
    };

    let probes = if args.probe {
        probe_syslog_sinks(&blueprint).await
    } else {
        Vec::new()
    };

    ValidationResult {
        valid: true,
        config_path,
        error: None,
        warnings: config_loader::ConfigLoader::warnings(&blueprint),
        summary: Some(ConfigSummary {
            version: format!("{:?}", blueprint.version),
            server_name: blueprint.general.server_name.clone(),
            sink_count: blueprint.sinks.len(),
            enabled_sinks: blueprint.sinks.iter().filter(|s| s.mode.is_enabled()).count(),
            skip_list: blueprint.general.skip_domains_file.is_some(),
            allow_list: blueprint.general.allow_domains_file.is_some(),
        }),
        probes,
    }
}

fn print_validation_result(result: &ValidationResult) {
    if !result.valid {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
        return;
    }

    println!("✓ Configuration is valid: {}", result.config_path);

    if let Some(ref summary) = result.summary {
        println!("\n  Version: {}", summary.version);
        println!("  Server name: {}", summary.server_name);
        println!(
            "  Sinks: {} ({} enabled)",
            summary.sink_count, summary.enabled_sinks
        );
        println!("  Skip list: {}", if summary.skip_list { "yes" } else { "no" });
        println!("  Allow list: {}", if summary.allow_list { "yes" } else { "no" });
    }

    if !result.warnings.is_empty() {
        println!("\n⚠ Warnings:");
        for warning in &result.warnings {
            println!("  - {warning}");
        }
    }

    if !result.probes.is_empty() {
        println!("\nSyslog probes:");
        for probe in &result.probes {
            match probe.error {
                None => println!("  ✓ {} ({})", probe.sink, probe.endpoint),
                Some(ref error) => println!("  ✗ {} ({}): {}", probe.sink, probe.endpoint, error),
            }
        }
    }
}
