// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Egress Policy
//!
//! Permits traffic from a source (an app or a whole space) to an egress
//! destination. Both ends are terminals; the policy row references them by
//! foreign key, which is what keeps a referenced destination from being
//! deleted.

use crate::domain::destination::EgressDestination;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    App,
    Space,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::App => "app",
            SourceType::Space => "space",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "app" => Ok(SourceType::App),
            "space" => Ok(SourceType::Space),
            other => Err(format!("unknown source type: '{}'", other)),
        }
    }
}

/// Platform entity traffic originates from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EgressSource {
    pub source_type: SourceType,
    /// App or space GUID on the platform (not a terminal GUID).
    pub id: String,
    /// Terminal anchoring this source. Empty until persisted.
    #[serde(default)]
    pub terminal_guid: String,
}

impl EgressSource {
    pub fn app(id: impl Into<String>) -> Self {
        Self {
            source_type: SourceType::App,
            id: id.into(),
            terminal_guid: String::new(),
        }
    }

    pub fn space(id: impl Into<String>) -> Self {
        Self {
            source_type: SourceType::Space,
            id: id.into(),
            terminal_guid: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EgressPolicy {
    pub guid: String,
    pub source: EgressSource,
    /// On create only `destination.guid` is read; reads return the full destination.
    pub destination: EgressDestination,
}

impl EgressPolicy {
    pub fn new(source: EgressSource, destination_guid: impl Into<String>) -> Self {
        Self {
            guid: String::new(),
            source,
            destination: EgressDestination {
                guid: destination_guid.into(),
                ..EgressDestination::default()
            },
        }
    }
}
