//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// dnsfanout - fan decoded DNS records out to console and syslog sinks
#[derive(Parser, Debug)]
#[command(
    name = "dnsfanout",
    author,
    version,
    about = "DNS record output dispatcher",
    long_about = "Reads decoded DNS records and delivers them to every configured sink.\n\n\
                  Each sink filters query names against shared skip/allow domain lists, \n\
                  which are reloaded from disk on a timer."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "DNSFANOUT_VERBOSE")]
    pub verbose: u8,

    /// Suppress all log output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (logs always go to stderr)
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "DNSFANOUT_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log level derived from -v / -q
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Prometheus port requested by the command, if any
    pub fn metrics_port(&self) -> Option<u16> {
        match &self.command {
            Commands::Run(args) => (args.metrics_port != 0).then_some(args.metrics_port),
            _ => None,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dispatch records from a JSON-lines stream to the configured sinks
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "dnsfanout.toml",
        env = "DNSFANOUT_CONFIG"
    )]
    pub config: PathBuf,

    /// JSON-lines record input, `-` for stdin
    #[arg(short, long, default_value = "-", env = "DNSFANOUT_INPUT")]
    pub input: String,

    /// Override general.server_name from configuration
    #[arg(long, env = "DNSFANOUT_SERVER_NAME")]
    pub server_name: Option<String>,

    /// Override general.result_channel_size from configuration
    #[arg(long, env = "DNSFANOUT_CHANNEL_SIZE")]
    pub channel_size: Option<usize>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "DNSFANOUT_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without dispatching
    #[arg(long)]
    pub dry_run: bool,

    /// Print the final run report as JSON (to stderr)
    #[arg(long)]
    pub report_json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "dnsfanout.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,

    /// Also try one connection to every enabled syslog collector
    #[arg(long)]
    pub probe: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "dnsfanout.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
