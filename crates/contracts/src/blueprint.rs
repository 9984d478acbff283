//! OutputBlueprint - Config Loader output
//!
//! Describes the whole output side: global dispatch settings, the
//! filter list sources, and every configured sink.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

use crate::{FilterMode, OutputFormat};

/// Default syslog reconnect interval
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OutputBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Process-wide dispatch settings
    #[serde(default)]
    #[validate(nested)]
    pub general: GeneralConfig,

    /// Sinks in registration order
    #[serde(default)]
    #[validate(nested)]
    pub sinks: Vec<SinkConfig>,
}

/// Global settings shared by the dispatcher and every sink
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GeneralConfig {
    /// Capacity of the result bus and of every sink input channel
    #[serde(default = "default_result_channel_size")]
    #[validate(range(min = 1))]
    pub result_channel_size: usize,

    /// Name used as the syslog tag
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Interval between stats snapshots in the operator log (0 = off)
    #[serde(default = "default_print_stats_delay_secs")]
    pub print_stats_delay_secs: u64,

    /// Skip list backing file
    #[serde(default)]
    pub skip_domains_file: Option<PathBuf>,

    /// Skip list reload interval (0 = load once)
    #[serde(default = "default_refresh_interval_secs")]
    pub skip_domains_refresh_interval_secs: u64,

    /// Allow list backing file
    #[serde(default)]
    pub allow_domains_file: Option<PathBuf>,

    /// Allow list reload interval (0 = load once)
    #[serde(default = "default_refresh_interval_secs")]
    pub allow_domains_refresh_interval_secs: u64,

    /// Upper bound on how long sinks may take to drain at shutdown
    #[serde(default = "default_drain_timeout_secs")]
    #[validate(range(min = 1))]
    pub drain_timeout_secs: u64,
}

fn default_result_channel_size() -> usize {
    100_000
}

fn default_server_name() -> String {
    "default".to_string()
}

fn default_print_stats_delay_secs() -> u64 {
    10
}

fn default_refresh_interval_secs() -> u64 {
    60
}

fn default_drain_timeout_secs() -> u64 {
    5
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            result_channel_size: default_result_channel_size(),
            server_name: default_server_name(),
            print_stats_delay_secs: default_print_stats_delay_secs(),
            skip_domains_file: None,
            skip_domains_refresh_interval_secs: default_refresh_interval_secs(),
            allow_domains_file: None,
            allow_domains_refresh_interval_secs: default_refresh_interval_secs(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

impl GeneralConfig {
    /// Stats snapshot interval, `None` when disabled
    pub fn print_stats_delay(&self) -> Option<Duration> {
        non_zero_secs(self.print_stats_delay_secs)
    }

    /// Skip list reload interval, `None` when no file or interval is zero
    pub fn skip_reload_interval(&self) -> Option<Duration> {
        self.skip_domains_file
            .as_ref()
            .and_then(|_| non_zero_secs(self.skip_domains_refresh_interval_secs))
    }

    /// Allow list reload interval, `None` when no file or interval is zero
    pub fn allow_reload_interval(&self) -> Option<Duration> {
        self.allow_domains_file
            .as_ref()
            .and_then(|_| non_zero_secs(self.allow_domains_refresh_interval_secs))
    }

    /// Shutdown drain deadline
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    /// Sink name (logs and metrics label)
    pub name: String,

    /// Sink variant
    pub kind: SinkKind,

    /// Filter mode; `disabled` prunes the sink at startup
    #[serde(default)]
    pub mode: FilterMode,

    /// Line encoding (console only)
    #[serde(default)]
    pub format: OutputFormat,

    /// Number of concurrent delivery workers
    #[serde(default = "default_worker_count")]
    #[validate(range(min = 1, max = 1024))]
    pub worker_count: usize,

    /// Remote endpoint, e.g. `udp://127.0.0.1:514` (network sinks)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Reconnect interval in seconds (network sinks)
    #[serde(default)]
    #[validate(range(min = 1))]
    pub retry_interval_secs: Option<u64>,
}

fn default_worker_count() -> usize {
    8
}

impl SinkConfig {
    /// Console sink with the given mode and format
    pub fn console(name: impl Into<String>, mode: FilterMode, format: OutputFormat) -> Self {
        Self {
            name: name.into(),
            kind: SinkKind::Console,
            mode,
            format,
            worker_count: default_worker_count(),
            endpoint: None,
            retry_interval_secs: None,
        }
    }

    /// Syslog sink targeting `endpoint`
    pub fn syslog(name: impl Into<String>, mode: FilterMode, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SinkKind::Syslog,
            mode,
            format: OutputFormat::Json,
            worker_count: 1,
            endpoint: Some(endpoint.into()),
            retry_interval_secs: None,
        }
    }

    /// Builder-style worker count override
    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Reconnect interval, falling back to the default when unset or zero
    pub fn retry_interval(&self) -> Duration {
        self.retry_interval_secs
            .and_then(non_zero_secs)
            .unwrap_or(DEFAULT_RETRY_INTERVAL)
    }
}

/// Sink variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Process standard output
    Console,
    /// Syslog collector over udp, tcp or a unix socket
    Syslog,
}
