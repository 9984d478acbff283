//! SinkRegistry - ordered sinks collected at startup

use contracts::{SinkConfig, SinkKind};
use tracing::{debug, info, instrument};

use crate::error::DispatcherError;
use crate::sink::{OutputSink, SinkContext};
use crate::sinks::{ConsoleSink, SyslogSink};

/// Sinks in registration order, before initialization
#[derive(Default)]
pub struct SinkRegistry {
    sinks: Vec<Box<dyn OutputSink>>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one sink per configuration entry, in order
    pub fn from_configs(configs: &[SinkConfig]) -> Self {
        let mut registry = Self::new();
        for config in configs {
            registry.register_boxed(create_sink(config));
        }
        registry
    }

    pub fn register(&mut self, sink: impl OutputSink + 'static) {
        self.register_boxed(Box::new(sink));
    }

    pub fn register_boxed(&mut self, sink: Box<dyn OutputSink>) {
        debug!(sink = %sink.name(), position = self.sinks.len(), "Sink registered");
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Initialize every sink once, in order, and keep the enabled ones
    ///
    /// Disabled sinks are dropped; any other failure aborts startup.
    /// Consumes the registry so nothing can be initialized twice.
    #[instrument(name = "sink_registry_initialize", skip_all, fields(registered = self.sinks.len()))]
    pub fn initialize_all(
        self,
        ctx: &SinkContext,
    ) -> Result<Vec<Box<dyn OutputSink>>, DispatcherError> {
        let mut active = Vec::with_capacity(self.sinks.len());

        for mut sink in self.sinks {
            match sink.initialize(ctx) {
                Ok(()) => active.push(sink),
                Err(e) if e.is_not_configured() => {
                    debug!(sink = %sink.name(), "Sink not configured, pruned");
                }
                Err(e) => return Err(DispatcherError::sink_init(sink.name(), e)),
            }
        }

        if active.is_empty() {
            return Err(DispatcherError::NoSinks);
        }

        info!(
            active = active.len(),
            sinks = ?active.iter().map(|s| s.name()).collect::<Vec<_>>(),
            "Sinks initialized"
        );
        Ok(active)
    }
}

/// Create a sink from its configuration
fn create_sink(config: &SinkConfig) -> Box<dyn OutputSink> {
    match config.kind {
        SinkKind::Console => Box::new(ConsoleSink::new(config.clone())),
        SinkKind::Syslog => Box::new(SyslogSink::new(config.clone())),
    }
}
