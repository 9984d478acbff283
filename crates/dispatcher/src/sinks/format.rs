//! Line encodings shared by the sinks

use chrono::{DateTime, Datelike, SecondsFormat, Timelike, Utc};
use contracts::{DnsRecord, Question};
use std::fmt::Write;

/// CSV column names, in row order
pub const CSV_HEADER: &str = "year,month,day,hour,minute,second,ip_version,src_ip,dst_ip,\
protocol,packet_length,id,response,opcode,rcode,question,qtype,qclass,answer_count";

/// Syslog facility `daemon` (3)
const FACILITY_DAEMON: u8 = 3;
/// Syslog severity `alert` (1)
const SEVERITY_ALERT: u8 = 1;

/// Priority value of every message: daemon.alert
pub const SYSLOG_PRIORITY: u8 = FACILITY_DAEMON * 8 + SEVERITY_ALERT;

/// Encode the whole record as one JSON line
pub fn json_line(record: &DnsRecord) -> Result<String, serde_json::Error> {
    serde_json::to_string(record)
}

/// Encode one record/question pair as a CSV row
pub fn csv_row(record: &DnsRecord, question: &Question) -> String {
    let ts = record.timestamp;
    let msg = &record.message;
    let mut row = String::with_capacity(128);

    // infallible for String
    let _ = write!(
        row,
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},",
        ts.year(),
        ts.month(),
        ts.day(),
        ts.hour(),
        ts.minute(),
        ts.second(),
        record.ip_version,
        record.src_ip,
        record.dst_ip,
        record.protocol,
        record.packet_length,
        msg.id,
        msg.response,
        msg.opcode,
        msg.rcode,
    );
    push_csv_field(&mut row, &question.name);
    let _ = write!(
        row,
        ",{},{},{}",
        question.qtype, question.qclass, msg.answer_count
    );
    row
}

fn push_csv_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

/// Frame a message the way `log/syslog`-style clients do:
/// `<PRI>TIMESTAMP HOSTNAME TAG[PID]: MSG`
pub fn syslog_frame(
    timestamp: DateTime<Utc>,
    hostname: &str,
    tag: &str,
    pid: u32,
    body: &str,
) -> String {
    format!(
        "<{}>{} {} {}[{}]: {}",
        SYSLOG_PRIORITY,
        timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        hostname,
        tag,
        pid,
        body
    )
}
