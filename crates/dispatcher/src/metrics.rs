//! Per-sink delivery counters

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Delivery counters owned by a single sink
///
/// Counted per question, not per record.
#[derive(Debug, Default)]
pub struct SinkStats {
    sent: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

impl SinkStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Questions handed to the transport
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn inc_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Questions dropped by the domain filter
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn inc_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Questions the transport failed to deliver
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sent: self.sent(),
            skipped: self.skipped(),
            failed: self.failed(),
        }
    }
}

/// Point-in-time copy of [`SinkStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub sent: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sent={} skipped={} failed={}",
            self.sent, self.skipped, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let stats = SinkStats::new();
        stats.inc_sent();
        stats.inc_sent();
        stats.inc_skipped();
        stats.inc_failed();

        let snap = stats.snapshot();
        assert_eq!(
            snap,
            StatsSnapshot {
                sent: 2,
                skipped: 1,
                failed: 1
            }
        );
        assert_eq!(snap.to_string(), "sent=2 skipped=1 failed=1");
    }
}
