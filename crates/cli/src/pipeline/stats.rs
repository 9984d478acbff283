//! Run statistics.
//!
//! Everything here is printed to stderr: stdout belongs to the console sink.

use std::time::Duration;

use dispatcher::DispatchReport;
use serde::Serialize;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    /// Wall time from start to drained
    #[serde(serialize_with = "as_secs_f64")]
    pub duration: Duration,

    /// Records parsed from the input
    pub records_read: u64,

    /// Input lines that were not valid records
    pub malformed: u64,

    /// Dispatcher summary
    pub report: DispatchReport,
}

impl RunStats {
    /// Records per second over the whole run
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.report.records_dispatched as f64 / secs
        } else {
            0.0
        }
    }

    /// Render the human readable summary
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str("\n=== Dispatch Summary ===\n\n");
        out.push_str(&format!("   ├─ Duration: {:.2}s\n", self.duration.as_secs_f64()));
        out.push_str(&format!("   ├─ Records read: {}\n", self.records_read));
        out.push_str(&format!("   ├─ Malformed lines: {}\n", self.malformed));
        out.push_str(&format!(
            "   ├─ Records dispatched: {}\n",
            self.report.records_dispatched
        ));
        out.push_str(&format!("   ├─ Throughput: {:.2} rec/s\n", self.throughput()));
        out.push_str(&format!(
            "   └─ Drained cleanly: {}\n",
            if self.report.drained { "yes" } else { "no" }
        ));

        if !self.report.sinks.is_empty() {
            out.push_str(&format!("\nSinks ({})\n", self.report.sinks.len()));
            for (i, sink) in self.report.sinks.iter().enumerate() {
                let prefix = if i + 1 == self.report.sinks.len() { "└─" } else { "├─" };
                out.push_str(&format!("   {} {}: {}\n", prefix, sink.name, sink.stats));
            }
        }
        out
    }

    /// Print the summary to stderr
    pub fn print_summary(&self) {
        eprintln!("{}", self.summary());
    }
}

fn as_secs_f64<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatcher::{SinkReport, StatsSnapshot};

    fn stats() -> RunStats {
        RunStats {
            duration: Duration::from_secs(2),
            records_read: 10,
            malformed: 1,
            report: DispatchReport {
                records_dispatched: 10,
                sinks: vec![SinkReport {
                    name: "stdout".into(),
                    stats: StatsSnapshot {
                        sent: 8,
                        skipped: 2,
                        failed: 0,
                    },
                }],
                drained: true,
            },
        }
    }

    #[test]
    fn throughput_over_duration() {
        assert_eq!(stats().throughput(), 5.0);

        let mut idle = stats();
        idle.duration = Duration::ZERO;
        assert_eq!(idle.throughput(), 0.0);
    }

    #[test]
    fn summary_lists_sinks() {
        let text = stats().summary();
        assert!(text.contains("Records dispatched: 10"));
        assert!(text.contains("stdout: sent=8 skipped=2 failed=0"));
    }

    #[test]
    fn json_report_flattens_sink_stats() {
        let json = serde_json::to_value(stats()).unwrap();
        assert_eq!(json["duration"], 2.0);
        assert_eq!(json["report"]["sinks"][0]["skipped"], 2);
    }
}
