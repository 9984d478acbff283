//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::{load_blueprint, probe_syslog_sinks};
use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let mut blueprint = load_blueprint(&args.config)?;

    // Apply CLI overrides
    if let Some(ref server_name) = args.server_name {
        info!(server_name = %server_name, "Overriding server name from CLI");
        blueprint.general.server_name = server_name.clone();
    }
    if let Some(size) = args.channel_size {
        info!(channel_size = size, "Overriding result channel size from CLI");
        blueprint.general.result_channel_size = size;
    }
    config_loader::ConfigLoader::validate(&blueprint)
        .context("Configuration invalid after CLI overrides")?;

    for warning in config_loader::ConfigLoader::warnings(&blueprint) {
        warn!("{warning}");
    }

    info!(
        server_name = %blueprint.general.server_name,
        sinks = blueprint.sinks.len(),
        enabled = blueprint.sinks.iter().filter(|s| s.mode.is_enabled()).count(),
        "Configuration loaded"
    );

    // Dry run - validate, probe collectors once and exit
    if args.dry_run {
        info!("Dry run mode - probing syslog collectors, no records dispatched");
        let probes = probe_syslog_sinks(&blueprint).await;
        for probe in &probes {
            eprintln!(
                "  {} {} ({})",
                if probe.reachable { "✓" } else { "✗" },
                probe.sink,
                probe.endpoint
            );
        }
        if probes.iter().any(|p| !p.reachable) {
            anyhow::bail!("One or more syslog collectors are unreachable");
        }
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        input: args.input.clone(),
    });

    let exit = pipeline.exit_signal();
    let signals = tokio::spawn(async move {
        tokio::select! {
            _ = shutdown_signal() => {
                warn!("Received shutdown signal, draining sinks...");
                exit.fire();
            }
            _ = exit.fired() => {}
        }
    });

    info!("Starting pipeline...");
    let result = pipeline.run().await;
    signals.abort();

    let stats = result.context("Pipeline execution failed")?;
    if args.report_json {
        let json = serde_json::to_string_pretty(&stats).context("Failed to serialize report")?;
        eprintln!("{json}");
    } else {
        stats.print_summary();
    }

    info!("dnsfanout finished");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed just never resolves.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
