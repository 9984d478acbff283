//! Output pipeline metrics
//!
//! Thin wrappers over the `metrics` facade so metric names and labels
//! live in one place. Every function is a no-op until a recorder is
//! installed (see [`crate::init_with_config`]).

use metrics::{counter, gauge};

/// Record one upstream record handed to every active sink
pub fn record_record_dispatched() {
    counter!("dnsfanout_records_dispatched_total").increment(1);
}

/// Record the number of sinks that survived startup pruning
pub fn record_active_sinks(count: usize) {
    gauge!("dnsfanout_active_sinks").set(count as f64);
}

/// Record a query handed to a sink's transport
pub fn record_sink_sent(sink_name: &str) {
    counter!("dnsfanout_sink_sent_total", "sink" => sink_name.to_string()).increment(1);
}

/// Record a query dropped by the domain filter
pub fn record_sink_skipped(sink_name: &str) {
    counter!("dnsfanout_sink_skipped_total", "sink" => sink_name.to_string()).increment(1);
}

/// Record a query the transport failed to deliver
pub fn record_sink_failed(sink_name: &str) {
    counter!("dnsfanout_sink_failed_total", "sink" => sink_name.to_string()).increment(1);
}

/// Record a network sink connection attempt
pub fn record_connect_attempt(sink_name: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(
        "dnsfanout_syslog_connect_attempts_total",
        "sink" => sink_name.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a domain list reload
///
/// `entries` is only meaningful when `success` is true.
pub fn record_filter_reload(list: &str, success: bool, entries: usize) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "dnsfanout_filter_reload_total",
        "list" => list.to_string(),
        "status" => status
    )
    .increment(1);

    if success {
        gauge!("dnsfanout_filter_entries", "list" => list.to_string()).set(entries as f64);
    }
}
