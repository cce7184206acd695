// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! JSON wire schema for destinations and egress policies.
//!
//! Fields are kept loosely typed (protocol as a string, ports as plain
//! integers) so a malformed payload still decodes and is rejected by the
//! validator with a readable message instead of a serde error.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireIpRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePorts {
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireDestination {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub protocol: String,
    pub ips: Vec<WireIpRange>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<WirePorts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icmp_type: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icmp_code: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationsPayload {
    #[serde(default)]
    pub total_destinations: usize,
    #[serde(default)]
    pub destinations: Vec<WireDestination>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEgressSource {
    /// `app`, `space`, or empty for `app`.
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub source_type: String,
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEgressPolicy {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub source: WireEgressSource,
    /// Only `id` is read on input.
    #[serde(default)]
    pub destination: WireDestination,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EgressPoliciesPayload {
    #[serde(default)]
    pub total_egress_policies: usize,
    #[serde(default)]
    pub egress_policies: Vec<WireEgressPolicy>,
}
