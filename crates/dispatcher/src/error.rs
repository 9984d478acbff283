//! Sink and dispatcher error types

use thiserror::Error;

/// Sink-level errors
#[derive(Debug, Error)]
pub enum SinkError {
    /// Sink is disabled; the registry prunes it silently
    #[error("sink '{0}' is not configured")]
    NotConfigured(String),

    /// Invalid or missing sink settings
    #[error("invalid configuration for sink '{name}': {message}")]
    InvalidConfig { name: String, message: String },

    /// Connection to an external collector failed
    #[error("sink '{name}' connection failed: {source}")]
    Connection {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Output could not be encoded
    #[error("sink '{name}' encode failed: {message}")]
    Encode { name: String, message: String },

    /// Writing to the transport failed
    #[error("sink '{name}' write failed: {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Sink used before `initialize`, or after `close`
    #[error("sink '{0}' is not running")]
    NotRunning(String),
}

impl SinkError {
    pub fn invalid_config(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn encode(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Encode {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn write(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::Write {
            name: name.into(),
            source,
        }
    }

    /// Whether this is the "disabled, prune me" sentinel
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured(_))
    }
}

/// Dispatcher-level errors, all fatal at startup
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Every registered sink was pruned
    #[error("no output sinks are enabled")]
    NoSinks,

    /// A sink failed to initialize for a reason other than being disabled
    #[error("failed to initialize sink '{name}': {source}")]
    SinkInit {
        name: String,
        #[source]
        source: SinkError,
    },
}

impl DispatcherError {
    pub fn sink_init(name: impl Into<String>, source: SinkError) -> Self {
        Self::SinkInit {
            name: name.into(),
            source,
        }
    }
}
