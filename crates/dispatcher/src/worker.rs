//! WorkerPool - a sink's input channel plus the workers draining it

use std::sync::Arc;
use std::time::Duration;

use async_channel::{Receiver, Sender};
use contracts::{DnsRecord, FilterMode, Question, SharedRecord};
use domain_filter::DomainFilter;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::error::SinkError;
use crate::metrics::SinkStats;
use crate::shutdown::ExitSignal;
use crate::sink::SinkContext;

/// Sink-specific delivery of one question
#[trait_variant::make(RecordEmitter: Send)]
pub trait LocalRecordEmitter {
    /// Deliver `question` of `record` to the external system
    async fn emit(&self, record: &DnsRecord, question: &Question) -> Result<(), SinkError>;
}

/// Running workers of one sink
pub struct WorkerPool {
    name: String,
    tx: Sender<SharedRecord>,
    workers: Vec<JoinHandle<()>>,
    reporter: Option<JoinHandle<()>>,
    stats: Arc<SinkStats>,
    exit: ExitSignal,
}

impl WorkerPool {
    /// Create the input channel and spawn `worker_count` workers on it
    ///
    /// `exit` should be a child of the context signal owned by the sink;
    /// the pool fires it once the workers are done.
    pub fn spawn<E>(
        name: &str,
        mode: FilterMode,
        worker_count: usize,
        emitter: Arc<E>,
        stats: Arc<SinkStats>,
        ctx: &SinkContext,
        exit: ExitSignal,
    ) -> Self
    where
        E: RecordEmitter + Send + Sync + 'static,
    {
        let (tx, rx) = async_channel::bounded(ctx.channel_capacity);

        let workers = (0..worker_count.max(1))
            .map(|id| {
                let worker = DeliveryWorker {
                    id,
                    name: name.to_string(),
                    mode,
                    filter: Arc::clone(&ctx.filter),
                    emitter: Arc::clone(&emitter),
                    stats: Arc::clone(&stats),
                };
                let rx = rx.clone();
                tokio::spawn(async move { worker.run(rx).await })
            })
            .collect();

        let reporter = ctx.stats_interval.map(|interval| {
            let name = name.to_string();
            let stats = Arc::clone(&stats);
            let exit = exit.clone();
            tokio::spawn(async move { stats_reporter(name, stats, interval, exit).await })
        });

        debug!(sink = %name, workers = worker_count, capacity = ctx.channel_capacity, "Worker pool started");

        Self {
            name: name.to_string(),
            tx,
            workers,
            reporter,
            stats,
            exit,
        }
    }

    pub fn sender(&self) -> Sender<SharedRecord> {
        self.tx.clone()
    }

    pub fn stats(&self) -> &Arc<SinkStats> {
        &self.stats
    }

    /// Close the channel, let the workers drain it, then stop the reporter
    #[instrument(name = "worker_pool_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        self.tx.close();
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!(sink = %self.name, error = ?e, "Worker task panicked");
            }
        }

        self.exit.fire();
        if let Some(reporter) = self.reporter {
            let _ = reporter.await;
        }

        info!(sink = %self.name, stats = %self.stats.snapshot(), "Sink drained");
    }
}

struct DeliveryWorker<E> {
    id: usize,
    name: String,
    mode: FilterMode,
    filter: Arc<DomainFilter>,
    emitter: Arc<E>,
    stats: Arc<SinkStats>,
}

impl<E: RecordEmitter> DeliveryWorker<E> {
    #[instrument(name = "sink_worker_loop", skip(self, rx), fields(sink = %self.name, worker = self.id))]
    async fn run(self, rx: Receiver<SharedRecord>) {
        debug!("Sink worker started");

        // recv fails only once the channel is closed and empty
        while let Ok(record) = rx.recv().await {
            self.deliver(&record).await;
        }

        debug!("Sink worker stopped");
    }

    async fn deliver(&self, record: &DnsRecord) {
        for question in record.questions() {
            if self.filter.should_skip(self.mode, &question.name) {
                self.stats.inc_skipped();
                observability::record_sink_skipped(&self.name);
                continue;
            }

            self.stats.inc_sent();
            observability::record_sink_sent(&self.name);

            if let Err(e) = self.emitter.emit(record, question).await {
                self.stats.inc_failed();
                observability::record_sink_failed(&self.name);
                warn!(
                    sink = %self.name,
                    query = %question.name,
                    error = %e,
                    "Delivery failed"
                );
            }
        }
    }
}

async fn stats_reporter(name: String, stats: Arc<SinkStats>, every: Duration, exit: ExitSignal) {
    let mut ticker = tokio::time::interval(every);
    // first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = exit.fired() => break,
            _ = ticker.tick() => {
                let snap = stats.snapshot();
                info!(
                    sink = %name,
                    sent = snap.sent,
                    skipped = snap.skipped,
                    failed = snap.failed,
                    "Sink stats"
                );
            }
        }
    }
}
