//! SyslogSink - one message per delivered question to a syslog collector

use std::sync::Arc;
use std::time::Duration;

use async_channel::Sender;
use async_trait::async_trait;
use chrono::Utc;
use contracts::{DnsRecord, Question, SharedRecord, SinkConfig};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::SinkError;
use crate::metrics::SinkStats;
use crate::shutdown::ExitSignal;
use crate::sink::{OutputSink, SinkContext};
use crate::sinks::format;
use crate::sinks::transport::{is_connection_error, Connector, NetConnector, SyslogEndpoint, Transport};
use crate::worker::{RecordEmitter, WorkerPool};

/// Shared connection to a collector, re-established on demand
pub struct SyslogLink {
    name: String,
    connector: Arc<dyn Connector>,
    conn: Mutex<Option<Box<dyn Transport>>>,
    retry_interval: Duration,
    retry: bool,
    exit: ExitSignal,
}

impl SyslogLink {
    /// `retry = false` gives up after the first failed attempt
    pub fn new(
        name: impl Into<String>,
        connector: Arc<dyn Connector>,
        retry_interval: Duration,
        retry: bool,
        exit: ExitSignal,
    ) -> Self {
        Self {
            name: name.into(),
            connector,
            conn: Mutex::new(None),
            retry_interval,
            retry,
            exit,
        }
    }

    /// Connect on a fixed interval until success or exit
    ///
    /// Returns `None` once the exit signal fires, or after one failure
    /// when retrying is off.
    #[instrument(name = "syslog_connect", skip(self), fields(sink = %self.name))]
    pub async fn connect_with_retry(&self) -> Option<Box<dyn Transport>> {
        let target = self.connector.target();
        let mut attempt: u32 = 0;

        loop {
            if self.exit.is_fired() {
                return None;
            }
            attempt += 1;

            match self.connector.connect().await {
                Ok(transport) => {
                    observability::record_connect_attempt(&self.name, true);
                    info!(target = %target, attempt, "Connected to syslog collector");
                    return Some(transport);
                }
                Err(e) => {
                    observability::record_connect_attempt(&self.name, false);
                    if !self.retry {
                        warn!(target = %target, error = %e, "Syslog connection failed");
                        return None;
                    }
                    warn!(
                        target = %target,
                        attempt,
                        error = %e,
                        retry_in = ?self.retry_interval,
                        "Syslog connection failed, retrying"
                    );
                }
            }

            tokio::select! {
                _ = self.exit.fired() => {
                    debug!("Exit signalled during reconnect backoff");
                    return None;
                }
                _ = tokio::time::sleep(self.retry_interval) => {}
            }
        }
    }

    /// Make sure a connection is up, connecting if needed
    pub async fn ensure_connected(&self) -> bool {
        let mut conn = self.conn.lock().await;
        if conn.is_none() {
            *conn = self.connect_with_retry().await;
        }
        conn.is_some()
    }

    /// Send one frame, reconnecting first if the connection was dropped
    pub async fn send(&self, frame: &[u8]) -> Result<(), SinkError> {
        let mut conn = self.conn.lock().await;
        if conn.is_none() {
            *conn = self.connect_with_retry().await;
        }
        let Some(transport) = conn.as_mut() else {
            return Err(SinkError::NotRunning(self.name.clone()));
        };

        match transport.send_frame(frame).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if is_connection_error(&e) {
                    warn!(sink = %self.name, error = %e, "Syslog connection lost, reconnecting on next send");
                    *conn = None;
                }
                Err(SinkError::write(&self.name, e))
            }
        }
    }
}

/// Syslog output sink
pub struct SyslogSink {
    config: SinkConfig,
    connector: Option<Arc<dyn Connector>>,
    pool: Option<WorkerPool>,
    connect_task: Option<JoinHandle<()>>,
    stats: Arc<SinkStats>,
}

impl SyslogSink {
    /// Syslog sink connecting to the configured endpoint
    pub fn new(config: SinkConfig) -> Self {
        Self {
            config,
            connector: None,
            pool: None,
            connect_task: None,
            stats: Arc::new(SinkStats::new()),
        }
    }

    /// Syslog sink using a custom connector instead of `endpoint`
    pub fn with_connector(config: SinkConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            connector: Some(connector),
            ..Self::new(config)
        }
    }

    fn resolve_connector(&self) -> Result<Arc<dyn Connector>, SinkError> {
        if let Some(connector) = &self.connector {
            return Ok(Arc::clone(connector));
        }
        let endpoint = endpoint_of(&self.config)?;
        Ok(Arc::new(NetConnector::new(endpoint)))
    }

    /// Dry run: try the configured endpoint once, without retrying
    #[instrument(name = "syslog_sink_probe", skip(config), fields(sink = %config.name))]
    pub async fn probe(config: &SinkConfig) -> Result<(), SinkError> {
        let endpoint = endpoint_of(config)?;
        let target = endpoint.to_string();
        let link = SyslogLink::new(
            &config.name,
            Arc::new(NetConnector::new(endpoint)),
            config.retry_interval(),
            false,
            ExitSignal::new(),
        );

        if link.ensure_connected().await {
            Ok(())
        } else {
            Err(SinkError::Connection {
                name: config.name.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotConnected,
                    format!("cannot reach {target}"),
                ),
            })
        }
    }
}

fn endpoint_of(config: &SinkConfig) -> Result<SyslogEndpoint, SinkError> {
    config
        .endpoint
        .as_deref()
        .ok_or_else(|| SinkError::invalid_config(&config.name, "syslog sink requires an endpoint"))?
        .parse::<SyslogEndpoint>()
        .map_err(|e| SinkError::invalid_config(&config.name, e.to_string()))
}

#[async_trait]
impl OutputSink for SyslogSink {
    fn name(&self) -> &str {
        &self.config.name
    }

    #[instrument(name = "syslog_sink_initialize", skip(self, ctx), fields(sink = %self.config.name))]
    fn initialize(&mut self, ctx: &SinkContext) -> Result<(), SinkError> {
        if !self.config.mode.is_enabled() {
            return Err(SinkError::NotConfigured(self.config.name.clone()));
        }
        if self.pool.is_some() {
            return Ok(());
        }

        let connector = self.resolve_connector()?;
        let exit = ctx.exit.child();
        let link = Arc::new(SyslogLink::new(
            &self.config.name,
            connector,
            self.config.retry_interval(),
            true,
            exit.clone(),
        ));

        // connect eagerly; workers reconnect lazily after a loss
        let eager = Arc::clone(&link);
        self.connect_task = Some(tokio::spawn(async move {
            eager.ensure_connected().await;
        }));

        let emitter = Arc::new(SyslogEmitter {
            link,
            hostname: local_hostname(),
            tag: ctx.server_name.clone(),
            pid: std::process::id(),
        });

        self.pool = Some(WorkerPool::spawn(
            &self.config.name,
            self.config.mode,
            self.config.worker_count,
            emitter,
            Arc::clone(&self.stats),
            ctx,
            exit,
        ));

        debug!(mode = %self.config.mode, "Syslog sink initialized");
        Ok(())
    }

    fn input_channel(&self) -> Option<Sender<SharedRecord>> {
        self.pool.as_ref().map(WorkerPool::sender)
    }

    async fn close(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.shutdown().await;
        }
        if let Some(task) = self.connect_task.take() {
            let _ = task.await;
        }
    }

    fn stats(&self) -> Arc<SinkStats> {
        Arc::clone(&self.stats)
    }
}

struct SyslogEmitter {
    link: Arc<SyslogLink>,
    hostname: String,
    tag: String,
    pid: u32,
}

impl RecordEmitter for SyslogEmitter {
    async fn emit(&self, record: &DnsRecord, _question: &Question) -> Result<(), SinkError> {
        let body = format::json_line(record)
            .map_err(|e| SinkError::encode(&self.link.name, e.to_string()))?;
        let frame = format::syslog_frame(Utc::now(), &self.hostname, &self.tag, self.pid, &body);
        self.link.send(frame.as_bytes()).await
    }
}

fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().trim().to_string())
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}
