//! # Dispatcher
//!
//! Output delivery for the DNS record pipeline.
//!
//! Responsible for:
//! - initializing registered sinks and pruning disabled ones
//! - fanning every record on the result bus out to each sink
//! - periodic domain list reloads
//! - cooperative shutdown through [`ExitSignal`]

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod shutdown;
pub mod sink;
pub mod sinks;
pub mod worker;

pub use contracts::SharedRecord;
pub use dispatcher::{
    DispatchReport, Dispatcher, DispatcherBuilder, DispatcherConfig, DispatcherState, SinkReport,
    StateHandle,
};
pub use error::{DispatcherError, SinkError};
pub use metrics::{SinkStats, StatsSnapshot};
pub use registry::SinkRegistry;
pub use shutdown::ExitSignal;
pub use sink::{OutputSink, SinkContext};
pub use sinks::{ConsoleSink, SyslogSink};
pub use worker::{RecordEmitter, WorkerPool};
