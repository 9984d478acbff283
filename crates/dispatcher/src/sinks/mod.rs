//! Sink implementations

pub mod console;
pub mod format;
pub mod syslog;
pub mod transport;

pub use console::ConsoleSink;
pub use syslog::{SyslogLink, SyslogSink};
pub use transport::{Connector, NetConnector, SyslogEndpoint, Transport};
