// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Network config documents and property injection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::CniError;

/// The fields of a CNI network config this adapter reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConf {
    pub name: String,
    #[serde(rename = "type")]
    pub plugin_type: String,
}

/// A parsed network config together with the raw document it came from.
/// Plugins receive `bytes`, so fields unknown to [`NetConf`] are preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub network: NetConf,
    pub bytes: Vec<u8>,
}

impl NetworkConfig {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, serde_json::Error> {
        let network = serde_json::from_slice(&bytes)?;
        Ok(Self { network, bytes })
    }
}

/// Returns a copy of `existing` whose document carries `encoded_properties`
/// under `network.properties`.
///
/// Empty input, or input decoding to an empty object, leaves the document
/// untouched.
pub fn inject_network_properties(
    existing: &NetworkConfig,
    encoded_properties: &str,
) -> Result<NetworkConfig, CniError> {
    if encoded_properties.trim().is_empty() {
        return Ok(existing.clone());
    }

    let properties: Map<String, Value> =
        serde_json::from_str(encoded_properties).map_err(CniError::UnmarshalProperties)?;
    if properties.is_empty() {
        return Ok(existing.clone());
    }

    let mut document: Map<String, Value> =
        serde_json::from_slice(&existing.bytes).map_err(CniError::UnmarshalExistingConfig)?;

    let mut network = Map::new();
    network.insert("properties".to_string(), Value::Object(properties));
    document.insert("network".to_string(), Value::Object(network));

    let bytes = serde_json::to_vec(&document).map_err(CniError::Marshal)?;
    Ok(NetworkConfig {
        network: existing.network.clone(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn existing() -> NetworkConfig {
        NetworkConfig {
            network: NetConf::default(),
            bytes: br#"{"something": "some-value"}"#.to_vec(),
        }
    }

    fn as_json(config: &NetworkConfig) -> Value {
        serde_json::from_slice(&config.bytes).unwrap()
    }

    #[test]
    fn test_inserts_properties_inside_network_field() {
        let injected = inject_network_properties(&existing(), r#"{"key": "value"}"#).unwrap();

        assert_eq!(
            as_json(&injected),
            json!({
                "something": "some-value",
                "network": {"properties": {"key": "value"}}
            })
        );
    }

    #[test]
    fn test_empty_properties_leave_config_unchanged() {
        assert_eq!(inject_network_properties(&existing(), "").unwrap(), existing());
        assert_eq!(inject_network_properties(&existing(), " {  }").unwrap(), existing());
    }

    #[test]
    fn test_malformed_existing_bytes() {
        let mut config = existing();
        config.bytes = b"%%%%%%".to_vec();

        let err = inject_network_properties(&config, r#"{"key": "value"}"#).unwrap_err();

        assert!(matches!(err, CniError::UnmarshalExistingConfig(_)));
        assert!(err.to_string().contains("unmarshal existing network bytes"));
    }

    #[test]
    fn test_malformed_properties() {
        let err = inject_network_properties(&existing(), "%%%%").unwrap_err();

        assert!(matches!(err, CniError::UnmarshalProperties(_)));
        assert!(err.to_string().contains("unmarshal garden properties"));
    }

    #[test]
    fn test_existing_network_field_is_replaced() {
        let config = NetworkConfig {
            network: NetConf::default(),
            bytes: br#"{"name": "mynet", "network": {"stale": true}}"#.to_vec(),
        };

        let injected = inject_network_properties(&config, r#"{"app_id": "some-app"}"#).unwrap();

        assert_eq!(
            as_json(&injected),
            json!({"name": "mynet", "network": {"properties": {"app_id": "some-app"}}})
        );
    }
}
