//! JSON-lines record source
//!
//! Stands in for the capture pipeline: each input line is one serialized
//! [`DnsRecord`]. Malformed lines are logged and counted, never fatal.

use std::path::Path;

use anyhow::{Context, Result};
use contracts::{DnsRecord, SharedRecord};
use dispatcher::ExitSignal;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Boxed line reader over stdin or a file
pub type InputReader = Box<dyn AsyncBufRead + Unpin + Send>;

/// Counters kept by the source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub records_read: u64,
    pub malformed: u64,
}

/// Open `-` as stdin, anything else as a file path
pub async fn open_input(input: &str) -> Result<InputReader> {
    if input == "-" {
        info!("Reading records from stdin");
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }

    let file = tokio::fs::File::open(Path::new(input))
        .await
        .with_context(|| format!("Failed to open record input {input}"))?;
    info!(path = %input, "Reading records from file");
    Ok(Box::new(BufReader::new(file)))
}

/// Feed records into the result bus until EOF, exit, or the bus closes
///
/// Dropping `bus` on return is what tells the dispatcher to drain.
pub async fn pump<R>(reader: R, bus: mpsc::Sender<SharedRecord>, exit: ExitSignal) -> SourceStats
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = SourceStats::default();
    let mut line_no = 0u64;

    loop {
        let line = tokio::select! {
            biased;
            _ = exit.fired() => {
                debug!("Record source stopped by exit signal");
                break;
            }
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Record input failed, stopping source");
                break;
            }
        };
        line_no += 1;

        if line.trim().is_empty() {
            continue;
        }

        let record = match serde_json::from_str::<DnsRecord>(&line) {
            Ok(record) => record,
            Err(e) => {
                stats.malformed += 1;
                warn!(line = line_no, error = %e, "Skipping malformed record");
                continue;
            }
        };

        tokio::select! {
            biased;
            _ = exit.fired() => break,
            sent = bus.send(SharedRecord::new(record)) => {
                if sent.is_err() {
                    debug!("Result bus closed, stopping source");
                    break;
                }
                stats.records_read += 1;
            }
        }
    }

    info!(
        records_read = stats.records_read,
        malformed = stats.malformed,
        "Record source finished"
    );
    stats
}
