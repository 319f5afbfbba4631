//! Packet Record - one captured IP packet observation
//!
//! Field names on the wire match the dashboard scripts
//! (`Timestamp`, `Source_IP`, `Dest_IP`, `Protocol`, `Length`).

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::constants::TIMESTAMP_FORMAT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketRecord {
    /// Capture time, `YYYY-MM-DD HH:MM:SS`. Kept as text so replayed data with bad values survives.
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Source_IP")]
    pub source_ip: String,
    #[serde(rename = "Dest_IP")]
    pub dest_ip: String,
    /// IP protocol number (6 = TCP, 17 = UDP, ...)
    #[serde(rename = "Protocol")]
    pub protocol: u32,
    /// Packet length in bytes
    #[serde(rename = "Length")]
    pub length: u64,
}

impl PacketRecord {
    pub fn new(
        timestamp: impl Into<String>,
        source_ip: impl Into<String>,
        dest_ip: impl Into<String>,
        protocol: u32,
        length: u64,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            source_ip: source_ip.into(),
            dest_ip: dest_ip.into(),
            protocol,
            length,
        }
    }

    /// Record stamped with the current local time
    pub fn now(source_ip: impl Into<String>, dest_ip: impl Into<String>, protocol: u32, length: u64) -> Self {
        Self::new(format_timestamp(&Local::now().naive_local()), source_ip, dest_ip, protocol, length)
    }

    /// Parsed capture time, `None` if the text is not in the fixed format
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }

    /// Hour of day (0-23) of the capture time
    pub fn hour(&self) -> Option<u32> {
        self.parsed_timestamp().map(|t| t.hour())
    }
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).ok()
}

pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Human-readable protocol name for logs
pub fn protocol_name(protocol: u32) -> &'static str {
    match protocol {
        1 => "ICMP",
        2 => "IGMP",
        6 => "TCP",
        17 => "UDP",
        58 => "ICMPv6",
        _ => "OTHER",
    }
}
