//! Pipeline orchestrator - wires the record source to the dispatcher.
//!
//! ```text
//! input (JSON lines) -> result bus (mpsc) -> Dispatcher -> sinks
//! ```
//!
//! Shutdown is driven by the shared [`ExitSignal`]: firing it stops the
//! source and makes the dispatcher drain. End of input does the same by
//! closing the bus.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::OutputBlueprint;
use dispatcher::{DispatcherBuilder, DispatcherConfig, ExitSignal, SinkRegistry};
use domain_filter::DomainFilter;
use tokio::sync::mpsc;
use tracing::info;

use super::source::{open_input, pump};
use super::RunStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated configuration, CLI overrides already applied
    pub blueprint: OutputBlueprint,

    /// JSON-lines input, `-` for stdin
    pub input: String,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
    exit: ExitSignal,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            exit: ExitSignal::new(),
        }
    }

    /// Handle that stops the pipeline when fired
    pub fn exit_signal(&self) -> ExitSignal {
        self.exit.clone()
    }

    /// Run the pipeline until the input ends or the exit signal fires
    pub async fn run(self) -> Result<RunStats> {
        let start_time = Instant::now();
        let general = &self.config.blueprint.general;

        let filter = Arc::new(DomainFilter::new(
            general.skip_domains_file.clone(),
            general.allow_domains_file.clone(),
        ));
        let (bus_tx, bus_rx) = mpsc::channel(general.result_channel_size);

        let registry = SinkRegistry::from_configs(&self.config.blueprint.sinks);
        info!(
            sinks = registry.len(),
            channel_size = general.result_channel_size,
            server_name = %general.server_name,
            "Starting dispatcher"
        );

        let dispatcher = DispatcherBuilder::new(registry, bus_rx)
            .config(DispatcherConfig::from_general(general))
            .filter(filter)
            .exit_signal(self.exit.clone())
            .build();
        let dispatcher_task = dispatcher.spawn();

        let reader = match open_input(&self.config.input).await {
            Ok(reader) => reader,
            Err(e) => {
                self.exit.fire();
                let _ = dispatcher_task.await;
                return Err(e);
            }
        };
        let source_task = tokio::spawn(pump(reader, bus_tx, self.exit.clone()));

        let outcome = dispatcher_task.await;
        // the source may still be parked on a read
        self.exit.fire();
        let source = source_task.await.context("Record source task panicked")?;

        let report = outcome
            .context("Dispatcher task panicked")?
            .context("Dispatcher failed")?;

        let stats = RunStats {
            duration: start_time.elapsed(),
            records_read: source.records_read,
            malformed: source.malformed,
            report,
        };

        info!(
            records_dispatched = stats.report.records_dispatched,
            malformed = stats.malformed,
            duration_secs = stats.duration.as_secs_f64(),
            throughput = format!("{:.2}", stats.throughput()),
            "Pipeline completed"
        );

        Ok(stats)
    }
}
