// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Egress Destination
//!
//! Store-side representation of an egress destination: the union of its
//! terminal (identity), its metadata row (name, description) and its IP range
//! row (network match criteria).
//!
//! The list shapes of `ip_ranges` and `ports` are kept for the wire schema;
//! only the first entry of each is persisted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Value stored for ICMP type/code when the caller did not provide one.
pub const ICMP_DEFAULT: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    All,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Icmp => "icmp",
            Protocol::All => "all",
        }
    }

    /// Whether port ranges are meaningful for this protocol.
    pub fn has_ports(&self) -> bool {
        matches!(self, Protocol::Tcp | Protocol::Udp)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown protocol: '{0}'")]
pub struct UnknownProtocol(pub String);

impl FromStr for Protocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            "icmp" => Ok(Protocol::Icmp),
            "all" => Ok(Protocol::All),
            other => Err(UnknownProtocol(other.to_string())),
        }
    }
}

/// Inclusive IPv4 range in textual form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRange {
    pub start: String,
    pub end: String,
}

impl IpRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Inclusive port range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EgressDestination {
    /// GUID of the owning terminal. Empty until the destination is created.
    pub guid: String,
    pub name: String,
    pub description: String,
    pub protocol: Protocol,
    pub ip_ranges: Vec<IpRange>,
    pub ports: Vec<PortRange>,
    pub icmp_type: i32,
    pub icmp_code: i32,
}

impl EgressDestination {
    pub fn new(name: impl Into<String>, protocol: Protocol, ip_range: IpRange) -> Self {
        Self {
            guid: String::new(),
            name: name.into(),
            description: String::new(),
            protocol,
            ip_ranges: vec![ip_range],
            ports: Vec::new(),
            icmp_type: ICMP_DEFAULT,
            icmp_code: ICMP_DEFAULT,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_ports(mut self, start: u16, end: u16) -> Self {
        self.ports = vec![PortRange { start, end }];
        self
    }

    pub fn with_icmp(mut self, icmp_type: i32, icmp_code: i32) -> Self {
        self.icmp_type = icmp_type;
        self.icmp_code = icmp_code;
        self
    }

    /// The persisted port range as `(start, end)`, `(0, 0)` meaning "any port".
    pub fn port_bounds(&self) -> (i64, i64) {
        self.ports
            .first()
            .map(|p| (i64::from(p.start), i64::from(p.end)))
            .unwrap_or((0, 0))
    }

    /// A zero-value destination is what `delete` returns for an unknown GUID.
    pub fn is_empty(&self) -> bool {
        self.guid.is_empty() && self.name.is_empty() && self.ip_ranges.is_empty()
    }
}

impl Default for EgressDestination {
    fn default() -> Self {
        Self {
            guid: String::new(),
            name: String::new(),
            description: String::new(),
            protocol: Protocol::All,
            ip_ranges: Vec::new(),
            ports: Vec::new(),
            icmp_type: ICMP_DEFAULT,
            icmp_code: ICMP_DEFAULT,
        }
    }
}
