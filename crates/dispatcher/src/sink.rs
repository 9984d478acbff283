//! OutputSink - capability set every output implements

use std::sync::Arc;
use std::time::Duration;

use async_channel::Sender;
use async_trait::async_trait;
use contracts::SharedRecord;
use domain_filter::DomainFilter;

use crate::error::SinkError;
use crate::metrics::SinkStats;
use crate::shutdown::ExitSignal;

/// Shared state handed to every sink at initialization
#[derive(Debug, Clone)]
pub struct SinkContext {
    /// Filter shared by all sinks
    pub filter: Arc<DomainFilter>,
    /// Process-wide exit signal
    pub exit: ExitSignal,
    /// Capacity of each sink's input channel
    pub channel_capacity: usize,
    /// Name this instance reports itself as
    pub server_name: String,
    /// Periodic stats log interval (None = off)
    pub stats_interval: Option<Duration>,
}

impl SinkContext {
    pub fn new(filter: Arc<DomainFilter>, exit: ExitSignal) -> Self {
        Self {
            filter,
            exit,
            channel_capacity: 1024,
            server_name: "default".to_string(),
            stats_interval: None,
        }
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn with_server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = server_name.into();
        self
    }

    pub fn with_stats_interval(mut self, interval: Option<Duration>) -> Self {
        self.stats_interval = interval;
        self
    }
}

/// An output destination driven by the dispatcher
///
/// Sinks are held as trait objects, so adding an output never touches the
/// dispatcher.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Sink name from configuration
    fn name(&self) -> &str;

    /// Start the sink's background work
    ///
    /// Returns [`SinkError::NotConfigured`] when the sink is disabled.
    /// Must not block: connection setup and delivery run on spawned tasks.
    fn initialize(&mut self, ctx: &SinkContext) -> Result<(), SinkError>;

    /// Bounded input channel, `None` until initialized
    fn input_channel(&self) -> Option<Sender<SharedRecord>>;

    /// Close the input, drain already queued records, stop all tasks
    async fn close(&mut self);

    /// Delivery counters
    fn stats(&self) -> Arc<SinkStats>;
}
