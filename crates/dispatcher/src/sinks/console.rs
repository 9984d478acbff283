//! ConsoleSink - one line per delivered question on stdout

use std::io::Write;
use std::sync::{Arc, Mutex};

use async_channel::Sender;
use async_trait::async_trait;
use contracts::{DnsRecord, OutputFormat, Question, SharedRecord, SinkConfig};
use tracing::{debug, instrument};

use crate::error::SinkError;
use crate::metrics::SinkStats;
use crate::sink::{OutputSink, SinkContext};
use crate::sinks::format;
use crate::worker::{RecordEmitter, WorkerPool};

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Console output sink
pub struct ConsoleSink {
    config: SinkConfig,
    writer: SharedWriter,
    pool: Option<WorkerPool>,
    stats: Arc<SinkStats>,
}

impl ConsoleSink {
    /// Console sink writing to stdout
    pub fn new(config: SinkConfig) -> Self {
        Self::with_writer(config, std::io::stdout())
    }

    /// Console sink writing to an arbitrary writer
    pub fn with_writer(config: SinkConfig, writer: impl Write + Send + 'static) -> Self {
        Self {
            config,
            writer: Arc::new(Mutex::new(Box::new(writer))),
            pool: None,
            stats: Arc::new(SinkStats::new()),
        }
    }

    fn write_header(&self) -> Result<(), SinkError> {
        let emitter = ConsoleEmitter {
            name: self.config.name.clone(),
            format: self.config.format,
            writer: Arc::clone(&self.writer),
        };
        emitter.write_line(format::CSV_HEADER)
    }
}

#[async_trait]
impl OutputSink for ConsoleSink {
    fn name(&self) -> &str {
        &self.config.name
    }

    #[instrument(name = "console_sink_initialize", skip(self, ctx), fields(sink = %self.config.name))]
    fn initialize(&mut self, ctx: &SinkContext) -> Result<(), SinkError> {
        if !self.config.mode.is_enabled() {
            return Err(SinkError::NotConfigured(self.config.name.clone()));
        }
        if self.pool.is_some() {
            return Ok(());
        }

        // header goes out before any worker can write a row
        if self.config.format == OutputFormat::Csv {
            self.write_header()?;
        }

        let emitter = Arc::new(ConsoleEmitter {
            name: self.config.name.clone(),
            format: self.config.format,
            writer: Arc::clone(&self.writer),
        });

        self.pool = Some(WorkerPool::spawn(
            &self.config.name,
            self.config.mode,
            self.config.worker_count,
            emitter,
            Arc::clone(&self.stats),
            ctx,
            ctx.exit.child(),
        ));

        debug!(
            format = ?self.config.format,
            mode = %self.config.mode,
            "Console sink initialized"
        );
        Ok(())
    }

    fn input_channel(&self) -> Option<Sender<SharedRecord>> {
        self.pool.as_ref().map(WorkerPool::sender)
    }

    async fn close(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.shutdown().await;
        }
    }

    fn stats(&self) -> Arc<SinkStats> {
        Arc::clone(&self.stats)
    }
}

struct ConsoleEmitter {
    name: String,
    format: OutputFormat,
    writer: SharedWriter,
}

impl ConsoleEmitter {
    fn encode(&self, record: &DnsRecord, question: &Question) -> Result<String, SinkError> {
        match self.format {
            OutputFormat::Json => {
                format::json_line(record).map_err(|e| SinkError::encode(&self.name, e.to_string()))
            }
            OutputFormat::Csv => Ok(format::csv_row(record, question)),
        }
    }

    fn write_line(&self, line: &str) -> Result<(), SinkError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| SinkError::NotRunning(self.name.clone()))?;
        write_terminated(&mut **writer, line).map_err(|e| SinkError::write(&self.name, e))
    }
}

fn write_terminated(writer: &mut dyn Write, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()
}

impl RecordEmitter for ConsoleEmitter {
    async fn emit(&self, record: &DnsRecord, question: &Question) -> Result<(), SinkError> {
        let line = self.encode(record, question)?;
        self.write_line(&line)
    }
}
