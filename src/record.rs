//! DNS record model: record types, targets and address handling.

use serde::Serialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

/// Address record types managed by the updater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RecordType {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Both record types, in processing order.
    pub const ALL: [RecordType; 2] = [RecordType::A, RecordType::Aaaa];

    /// Wire name of the record type.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// Whether `ip` belongs to the address family of this record type.
    pub fn matches(&self, ip: &IpAddr) -> bool {
        match self {
            RecordType::A => ip.is_ipv4(),
            RecordType::Aaaa => ip.is_ipv6(),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record name inside a zone.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct RecordTarget {
    pub zone: String,
    pub name: String,
}

impl RecordTarget {
    pub fn new(zone: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RecordTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name == "@" {
            f.write_str(&self.zone)
        } else {
            write!(f, "{}.{}", self.name, self.zone)
        }
    }
}

/// The record state a run wants the provider to hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredRecord {
    pub target: RecordTarget,
    pub record_type: RecordType,
    pub address: IpAddr,
    pub ttl: u32,
}

impl DesiredRecord {
    /// Canonical textual value sent to the provider.
    pub fn value(&self) -> String {
        self.address.to_string()
    }
}

/// The provider's current view of a record set.
///
/// Only single-value record sets are managed. When the provider reports
/// more than one value, the first one is kept and the rest are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteRecord {
    /// No record set exists for the name and type.
    Absent,
    /// The record set exists but holds no values.
    Empty,
    /// The record set's first value.
    Present(String),
}

/// Parse an address the way the updater compares them.
///
/// Accepts anything `IpAddr` accepts, dotted quads with zero-padded decimal
/// octets (`010.000.000.001`), and folds IPv4-mapped IPv6 into IPv4.
pub fn parse_address(s: &str) -> Option<IpAddr> {
    let s = s.trim();
    let ip = match s.parse::<IpAddr>() {
        Ok(ip) => ip,
        Err(_) => IpAddr::V4(parse_padded_ipv4(s)?),
    };
    Some(ip.to_canonical())
}

fn parse_padded_ipv4(s: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut parts = s.split('.');

    for octet in octets.iter_mut() {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *octet = part.parse().ok()?;
    }

    if parts.next().is_some() {
        return None;
    }

    Some(Ipv4Addr::from(octets))
}
