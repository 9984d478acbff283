//! Dispatcher - main loop fanning the result bus out to every sink

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_channel::Sender;
use contracts::{GeneralConfig, SharedRecord};
use domain_filter::{DomainFilter, ListKind};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use crate::error::DispatcherError;
use crate::metrics::{SinkStats, StatsSnapshot};
use crate::registry::SinkRegistry;
use crate::shutdown::ExitSignal;
use crate::sink::{OutputSink, SinkContext};

/// Dispatcher lifecycle
///
/// Starting -> Running -> Draining -> Stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DispatcherState {
    /// Initializing and pruning sinks
    Starting,
    /// Fanning out records
    Running,
    /// Closing sinks
    Draining,
    /// Done
    Stopped,
}

/// Lock-free read handle on the dispatcher state
#[derive(Debug, Clone)]
pub struct StateHandle(Arc<ArcSwap<DispatcherState>>);

impl StateHandle {
    fn new() -> Self {
        Self(Arc::new(ArcSwap::from_pointee(DispatcherState::Starting)))
    }

    pub fn current(&self) -> DispatcherState {
        **self.0.load()
    }

    fn set(&self, state: DispatcherState) {
        debug!(?state, "Dispatcher state");
        self.0.store(Arc::new(state));
    }
}

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Capacity of each sink's input channel
    pub channel_capacity: usize,
    /// Name this instance reports itself as
    pub server_name: String,
    /// Per-sink stats log interval
    pub stats_interval: Option<Duration>,
    /// Skip-list reload interval
    pub skip_reload: Option<Duration>,
    /// Allow-list reload interval
    pub allow_reload: Option<Duration>,
    /// Upper bound on closing all sinks
    pub drain_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::from_general(&GeneralConfig::default())
    }
}

impl DispatcherConfig {
    pub fn from_general(general: &GeneralConfig) -> Self {
        Self {
            channel_capacity: general.result_channel_size,
            server_name: general.server_name.clone(),
            stats_interval: general.print_stats_delay(),
            skip_reload: general.skip_reload_interval(),
            allow_reload: general.allow_reload_interval(),
            drain_timeout: general.drain_timeout(),
        }
    }
}

/// Per-sink line of the run report
#[derive(Debug, Clone, Serialize)]
pub struct SinkReport {
    pub name: String,
    #[serde(flatten)]
    pub stats: StatsSnapshot,
}

/// Summary returned once the dispatcher stops
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    /// Records read from the result bus
    pub records_dispatched: u64,
    /// Surviving sinks, in registry order
    pub sinks: Vec<SinkReport>,
    /// Whether every sink closed within the drain timeout
    pub drained: bool,
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    registry: SinkRegistry,
    bus: mpsc::Receiver<SharedRecord>,
    config: DispatcherConfig,
    filter: Option<Arc<DomainFilter>>,
    exit: Option<ExitSignal>,
}

impl DispatcherBuilder {
    pub fn new(registry: SinkRegistry, bus: mpsc::Receiver<SharedRecord>) -> Self {
        Self {
            registry,
            bus,
            config: DispatcherConfig::default(),
            filter: None,
            exit: None,
        }
    }

    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn filter(mut self, filter: Arc<DomainFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn exit_signal(mut self, exit: ExitSignal) -> Self {
        self.exit = Some(exit);
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            registry: self.registry,
            bus: self.bus,
            config: self.config,
            filter: self
                .filter
                .unwrap_or_else(|| Arc::new(DomainFilter::new(None, None))),
            exit: self.exit.unwrap_or_default(),
            state: StateHandle::new(),
        }
    }
}

/// Sink as seen by the running loop
struct ActiveSink {
    name: String,
    tx: Sender<SharedRecord>,
}

/// The main Dispatcher that fans out records to sinks
pub struct Dispatcher {
    registry: SinkRegistry,
    bus: mpsc::Receiver<SharedRecord>,
    config: DispatcherConfig,
    filter: Arc<DomainFilter>,
    exit: ExitSignal,
    state: StateHandle,
}

impl Dispatcher {
    pub fn state_handle(&self) -> StateHandle {
        self.state.clone()
    }

    pub fn exit_signal(&self) -> ExitSignal {
        self.exit.clone()
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(self) -> JoinHandle<Result<DispatchReport, DispatcherError>> {
        tokio::spawn(self.run())
    }

    /// Run until the result bus closes or the exit signal fires
    ///
    /// Startup errors (no enabled sink, a sink failing to initialize) are
    /// returned before any record is read.
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) -> Result<DispatchReport, DispatcherError> {
        // starting
        self.filter.load_all().await;

        let ctx = SinkContext::new(Arc::clone(&self.filter), self.exit.clone())
            .with_channel_capacity(self.config.channel_capacity)
            .with_server_name(self.config.server_name.clone())
            .with_stats_interval(self.config.stats_interval);

        let registry = std::mem::take(&mut self.registry);
        let sinks = match registry.initialize_all(&ctx) {
            Ok(sinks) => sinks,
            Err(e) => {
                self.state.set(DispatcherState::Stopped);
                return Err(e);
            }
        };
        observability::record_active_sinks(sinks.len());

        let active = self.collect_active(&sinks);
        let stats: Vec<(String, Arc<SinkStats>)> = sinks
            .iter()
            .map(|s| (s.name().to_string(), s.stats()))
            .collect();

        let mut skip_ticker = self.reload_ticker(ListKind::Skip, self.config.skip_reload);
        let mut allow_ticker = self.reload_ticker(ListKind::Allow, self.config.allow_reload);

        // running
        self.state.set(DispatcherState::Running);
        info!(sinks = active.len(), "Dispatcher started");

        let mut dispatched: u64 = 0;
        loop {
            tokio::select! {
                maybe = self.bus.recv() => match maybe {
                    Some(record) => {
                        if !self.fan_out(&active, record).await {
                            info!("Exit signalled during fan-out");
                            break;
                        }
                        dispatched += 1;
                        observability::record_record_dispatched();
                    }
                    None => {
                        info!(records = dispatched, "Result bus closed");
                        break;
                    }
                },
                _ = next_tick(&mut skip_ticker) => {
                    let _ = self.filter.reload(ListKind::Skip).await;
                }
                _ = next_tick(&mut allow_ticker) => {
                    let _ = self.filter.reload(ListKind::Allow).await;
                }
                _ = self.exit.fired() => {
                    info!(records = dispatched, "Exit signalled");
                    break;
                }
            }
        }

        // draining
        self.state.set(DispatcherState::Draining);
        drop(active);
        let drained = self.drain(sinks).await;

        self.state.set(DispatcherState::Stopped);
        let report = DispatchReport {
            records_dispatched: dispatched,
            sinks: stats
                .into_iter()
                .map(|(name, stats)| SinkReport {
                    name,
                    stats: stats.snapshot(),
                })
                .collect(),
            drained,
        };
        info!(records = report.records_dispatched, drained, "Dispatcher stopped");
        Ok(report)
    }

    fn collect_active(&self, sinks: &[Box<dyn OutputSink>]) -> Vec<ActiveSink> {
        sinks
            .iter()
            .filter_map(|sink| match sink.input_channel() {
                Some(tx) => Some(ActiveSink {
                    name: sink.name().to_string(),
                    tx,
                }),
                None => {
                    error!(sink = %sink.name(), "Sink has no input channel after initialize");
                    None
                }
            })
            .collect()
    }

    fn reload_ticker(&self, list: ListKind, every: Option<Duration>) -> Option<Interval> {
        let every = every?;
        self.filter.source(list)?;

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(list = %list, ?every, "Reload ticker armed");
        Some(ticker)
    }

    /// Hand one record to every sink in order, waiting on full channels
    ///
    /// Returns false if the exit signal fired while waiting.
    async fn fan_out(&self, active: &[ActiveSink], record: SharedRecord) -> bool {
        for sink in active {
            tokio::select! {
                sent = sink.tx.send(Arc::clone(&record)) => {
                    if sent.is_err() {
                        error!(sink = %sink.name, "Sink channel closed, record not delivered");
                    }
                }
                _ = self.exit.fired() => return false,
            }
        }
        true
    }

    /// Close every sink in parallel, bounded by the drain timeout
    #[instrument(name = "dispatcher_drain", skip_all, fields(sinks = sinks.len()))]
    async fn drain(&self, sinks: Vec<Box<dyn OutputSink>>) -> bool {
        let mut closing = JoinSet::new();
        for mut sink in sinks {
            closing.spawn(async move {
                sink.close().await;
                sink.name().to_string()
            });
        }

        let all_closed = async {
            while let Some(joined) = closing.join_next().await {
                match joined {
                    Ok(name) => debug!(sink = %name, "Sink closed"),
                    Err(e) => error!(error = ?e, "Sink close task failed"),
                }
            }
        };

        let outcome = tokio::time::timeout(self.config.drain_timeout, all_closed).await;
        match outcome {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    timeout = ?self.config.drain_timeout,
                    pending = closing.len(),
                    "Drain timed out, abandoning remaining sinks"
                );
                self.exit.fire();
                closing.abort_all();
                false
            }
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use async_trait::async_trait;
    use chrono::Utc;
    use contracts::{DnsRecord, FilterMode, OutputFormat, Question, SinkConfig};
    use crate::sinks::ConsoleSink;
    use domain_filter::DomainSet;
    use std::io::Write;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    /// Sink whose channel is never drained
    struct StalledSink {
        tx: Option<Sender<SharedRecord>>,
        rx: Option<async_channel::Receiver<SharedRecord>>,
        stats: Arc<SinkStats>,
    }

    impl StalledSink {
        fn new() -> Self {
            Self {
                tx: None,
                rx: None,
                stats: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl OutputSink for StalledSink {
        fn name(&self) -> &str {
            "stalled"
        }

        fn initialize(&mut self, _ctx: &SinkContext) -> Result<(), SinkError> {
            let (tx, rx) = async_channel::bounded(1);
            self.tx = Some(tx);
            self.rx = Some(rx);
            Ok(())
        }

        fn input_channel(&self) -> Option<Sender<SharedRecord>> {
            self.tx.clone()
        }

        async fn close(&mut self) {
            std::future::pending::<()>().await;
        }

        fn stats(&self) -> Arc<SinkStats> {
            Arc::clone(&self.stats)
        }
    }

    fn record(name: &str) -> SharedRecord {
        Arc::new(DnsRecord::query(
            Utc::now(),
            "10.3.3.3".parse().unwrap(),
            "10.3.3.53".parse().unwrap(),
            9,
            vec![Question::new(name, 1)],
        ))
    }

    fn config() -> DispatcherConfig {
        DispatcherConfig {
            channel_capacity: 8,
            server_name: "test".to_string(),
            stats_interval: None,
            skip_reload: None,
            allow_reload: None,
            drain_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn console_end_to_end_skips_and_keeps_order() {
        let buffer = Buffer::default();
        let mut registry = SinkRegistry::new();
        registry.register(ConsoleSink::with_writer(
            SinkConfig::console("stdout", FilterMode::SkipListOnly, OutputFormat::Json)
                .with_workers(1),
            buffer.clone(),
        ));

        let filter = DomainFilter::from_sets(
            ["tracker.test", "ads.test"].into_iter().collect(),
            DomainSet::new(),
        );
        let (tx, rx) = mpsc::channel(16);
        let dispatcher = DispatcherBuilder::new(registry, rx)
            .config(config())
            .filter(Arc::new(filter))
            .build();
        let state = dispatcher.state_handle();
        let handle = dispatcher.spawn();

        for name in ["one.test", "x.tracker.test", "two.test", "ads.test", "three.test"] {
            tx.send(record(name)).await.unwrap();
        }
        drop(tx);

        let report = handle.await.unwrap().unwrap();
        assert_eq!(state.current(), DispatcherState::Stopped);
        assert_eq!(report.records_dispatched, 5);
        assert!(report.drained);
        assert_eq!(report.sinks.len(), 1);
        assert_eq!(report.sinks[0].stats.skipped, 2);
        assert_eq!(report.sinks[0].stats.sent, 3);

        let names: Vec<String> = buffer
            .lines()
            .iter()
            .map(|l| serde_json::from_str::<DnsRecord>(l).unwrap().questions()[0].name.clone())
            .collect();
        assert_eq!(names, vec!["one.test", "two.test", "three.test"]);
    }

    #[tokio::test]
    async fn no_enabled_sinks_fails_before_running() {
        let mut registry = SinkRegistry::new();
        registry.register(ConsoleSink::with_writer(
            SinkConfig::console("stdout", FilterMode::Disabled, OutputFormat::Json),
            Buffer::default(),
        ));
        let (_tx, rx) = mpsc::channel(1);
        let dispatcher = DispatcherBuilder::new(registry, rx).config(config()).build();
        let state = dispatcher.state_handle();

        assert!(matches!(dispatcher.run().await, Err(DispatcherError::NoSinks)));
        assert_eq!(state.current(), DispatcherState::Stopped);
    }

    #[test]
    fn run_future_can_be_spawned() {
        fn assert_send<T: Send>(_: &T) {}

        let mut registry = SinkRegistry::new();
        registry.register(ConsoleSink::with_writer(
            SinkConfig::console("stdout", FilterMode::NoFilter, OutputFormat::Json),
            Buffer::default(),
        ));
        let (_tx, rx) = mpsc::channel(1);
        let run = DispatcherBuilder::new(registry, rx).config(config()).build().run();
        assert_send(&run);
    }

    #[tokio::test]
    async fn exit_signal_stops_running_dispatcher() {
        let buffer = Buffer::default();
        let mut registry = SinkRegistry::new();
        registry.register(ConsoleSink::with_writer(
            SinkConfig::console("stdout", FilterMode::NoFilter, OutputFormat::Json),
            buffer.clone(),
        ));
        let (tx, rx) = mpsc::channel(4);
        let exit = ExitSignal::new();
        let dispatcher = DispatcherBuilder::new(registry, rx)
            .config(config())
            .exit_signal(exit.clone())
            .build();
        let state = dispatcher.state_handle();
        let handle = dispatcher.spawn();

        tx.send(record("a.test")).await.unwrap();
        while state.current() != DispatcherState::Running {
            tokio::task::yield_now().await;
        }
        exit.fire();

        let report = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("dispatcher did not stop")
            .unwrap()
            .unwrap();
        assert_eq!(state.current(), DispatcherState::Stopped);
        assert!(report.records_dispatched <= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_sink_is_bounded_by_drain_timeout() {
        let mut registry = SinkRegistry::new();
        registry.register(StalledSink::new());
        let (tx, rx) = mpsc::channel(4);
        let exit = ExitSignal::new();
        let dispatcher = DispatcherBuilder::new(registry, rx)
            .config(DispatcherConfig {
                drain_timeout: Duration::from_secs(2),
                ..config()
            })
            .exit_signal(exit.clone())
            .build();
        let handle = dispatcher.spawn();

        drop(tx);
        let report = handle.await.unwrap().unwrap();
        assert!(!report.drained);
        assert!(exit.is_fired());
    }

    #[tokio::test(start_paused = true)]
    async fn exit_unblocks_fan_out_to_full_sink() {
        let mut registry = SinkRegistry::new();
        registry.register(StalledSink::new());
        let (tx, rx) = mpsc::channel(4);
        let exit = ExitSignal::new();
        let dispatcher = DispatcherBuilder::new(registry, rx)
            .config(DispatcherConfig {
                drain_timeout: Duration::from_millis(100),
                ..config()
            })
            .exit_signal(exit.clone())
            .build();
        let handle = dispatcher.spawn();

        // capacity 1: the second record blocks the loop
        for name in ["a.test", "b.test", "c.test"] {
            tx.send(record(name)).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        exit.fire();

        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.records_dispatched, 1);
    }

    #[tokio::test]
    async fn skip_list_reloads_on_ticker() {
        let dir = tempfile::tempdir().unwrap();
        let skip_path = dir.path().join("skip.txt");
        std::fs::write(&skip_path, "first.test\n").unwrap();

        let mut registry = SinkRegistry::new();
        registry.register(ConsoleSink::with_writer(
            SinkConfig::console("stdout", FilterMode::SkipListOnly, OutputFormat::Json),
            Buffer::default(),
        ));

        let filter = Arc::new(DomainFilter::new(Some(skip_path.clone()), None));
        let (tx, rx) = mpsc::channel(4);
        let dispatcher = DispatcherBuilder::new(registry, rx)
            .config(DispatcherConfig {
                skip_reload: Some(Duration::from_millis(50)),
                ..config()
            })
            .filter(Arc::clone(&filter))
            .build();
        let state = dispatcher.state_handle();
        let handle = dispatcher.spawn();

        // initial load completes before the loop starts
        while state.current() == DispatcherState::Starting {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(filter.snapshot(ListKind::Skip).contains_exact("first.test"));

        std::fs::write(&skip_path, "second.test\n").unwrap();
        let reloaded = tokio::time::timeout(Duration::from_secs(5), async {
            while !filter.snapshot(ListKind::Skip).contains_exact("second.test") {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(reloaded.is_ok(), "skip list never reloaded");
        assert!(!filter.snapshot(ListKind::Skip).contains_exact("first.test"));

        drop(tx);
        handle.await.unwrap().unwrap();
    }
}
