// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # CNI Adapter
//!
//! Loads CNI network configs from disk and injects per-container network
//! properties into them before a plugin is invoked.

pub mod config;
pub mod loader;

pub use config::{inject_network_properties, NetConf, NetworkConfig};
pub use loader::CniLoader;

#[derive(Debug, thiserror::Error)]
pub enum CniError {
    #[error("error loading config: {0}")]
    LoadConfig(#[source] std::io::Error),

    #[error("error parsing config {path}: {source}")]
    ParseConfig {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unmarshal existing network bytes: {0}")]
    UnmarshalExistingConfig(#[source] serde_json::Error),

    #[error("unmarshal garden properties: {0}")]
    UnmarshalProperties(#[source] serde_json::Error),

    #[error("marshal network config: {0}")]
    Marshal(#[source] serde_json::Error),
}
