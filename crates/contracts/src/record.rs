//! DnsRecord - capture pipeline output
//!
//! One decoded DNS packet as handed over on the result bus. Records are
//! immutable once produced and are shared between sinks by reference count.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

/// Record handle passed through every channel downstream of the bus
pub type SharedRecord = Arc<DnsRecord>;

/// Decoded DNS packet plus capture metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Capture timestamp
    pub timestamp: DateTime<Utc>,

    /// IP version of the carrying packet (4 or 6)
    pub ip_version: u8,

    /// Source address
    pub src_ip: IpAddr,

    /// Destination address
    pub dst_ip: IpAddr,

    /// Transport protocol
    pub protocol: TransportProtocol,

    /// Size of the captured packet in bytes
    pub packet_length: u16,

    /// Decoded DNS message
    pub message: DnsMessage,
}

/// DNS header fields and question section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DnsMessage {
    /// Transaction ID
    pub id: u16,

    /// QR bit: true for responses
    #[serde(default)]
    pub response: bool,

    /// Opcode
    #[serde(default)]
    pub opcode: u8,

    /// Response code
    #[serde(default)]
    pub rcode: u8,

    /// Question section
    pub questions: Vec<Question>,

    /// Number of records in the answer section
    #[serde(default)]
    pub answer_count: u16,
}

/// Single entry of the question section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Queried name as it appeared on the wire (may carry a trailing dot)
    pub name: String,

    /// QTYPE (1 = A, 28 = AAAA, ...)
    pub qtype: u16,

    /// QCLASS (1 = IN)
    #[serde(default = "default_qclass")]
    pub qclass: u16,
}

fn default_qclass() -> u16 {
    1
}

impl Question {
    /// Create an IN-class question
    pub fn new(name: impl Into<String>, qtype: u16) -> Self {
        Self {
            name: name.into(),
            qtype,
            qclass: default_qclass(),
        }
    }
}

/// Transport carrying the DNS message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportProtocol {
    Udp,
    Tcp,
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Udp => f.write_str("udp"),
            Self::Tcp => f.write_str("tcp"),
        }
    }
}

impl DnsRecord {
    /// Build a query record carrying the given questions
    pub fn query(
        timestamp: DateTime<Utc>,
        src_ip: IpAddr,
        dst_ip: IpAddr,
        id: u16,
        questions: Vec<Question>,
    ) -> Self {
        let ip_version = if src_ip.is_ipv4() { 4 } else { 6 };
        Self {
            timestamp,
            ip_version,
            src_ip,
            dst_ip,
            protocol: TransportProtocol::Udp,
            packet_length: 0,
            message: DnsMessage {
                id,
                questions,
                ..Default::default()
            },
        }
    }

    /// Questions carried by this record
    pub fn questions(&self) -> &[Question] {
        &self.message.questions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn json_defaults_fill_optional_header_fields() {
        let line = r#"{
            "timestamp": "2024-05-01T12:30:00Z",
            "ip_version": 4,
            "src_ip": "10.0.0.2",
            "dst_ip": "10.0.0.53",
            "protocol": "udp",
            "packet_length": 74,
            "message": { "id": 7, "questions": [{ "name": "example.com.", "qtype": 1 }] }
        }"#;

        let record: DnsRecord = serde_json::from_str(line).unwrap();
        assert_eq!(record.protocol, TransportProtocol::Udp);
        assert!(!record.message.response);
        assert_eq!(record.questions().len(), 1);
        assert_eq!(record.questions()[0].qclass, 1);
    }

    #[test]
    fn query_builder_infers_ip_version() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let v6 = DnsRecord::query(
            ts,
            "::1".parse().unwrap(),
            "::1".parse().unwrap(),
            1,
            vec![Question::new("a.test", 28)],
        );
        assert_eq!(v6.ip_version, 6);
        assert_eq!(v6.protocol.to_string(), "udp");
    }
}
