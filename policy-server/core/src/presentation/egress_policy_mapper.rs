// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Egress Policy Mapper
//!
//! Converts between the egress policies envelope and [`EgressPolicy`]. On
//! input only the destination id is read; on output destinations are written
//! with the same rules as the destinations envelope.

use std::sync::Arc;

use crate::domain::egress_policy::{EgressPolicy, EgressSource, SourceType};
use crate::presentation::egress_destination_mapper::as_wire_destination;
use crate::presentation::validator::{EgressPoliciesValidator, ValidationError};
use crate::presentation::wire::{EgressPoliciesPayload, WireEgressPolicy, WireEgressSource};
use crate::presentation::MapperError;

pub struct EgressPolicyMapper {
    validator: Arc<dyn EgressPoliciesValidator>,
}

impl EgressPolicyMapper {
    pub fn new(validator: Arc<dyn EgressPoliciesValidator>) -> Self {
        Self { validator }
    }

    pub fn as_bytes(&self, policies: &[EgressPolicy]) -> Result<Vec<u8>, MapperError> {
        let egress_policies: Vec<WireEgressPolicy> = policies
            .iter()
            .map(|policy| WireEgressPolicy {
                id: policy.guid.clone(),
                source: WireEgressSource {
                    source_type: policy.source.source_type.as_str().to_string(),
                    id: policy.source.id.clone(),
                },
                destination: as_wire_destination(&policy.destination),
            })
            .collect();

        let payload = EgressPoliciesPayload {
            total_egress_policies: egress_policies.len(),
            egress_policies,
        };
        serde_json::to_vec(&payload).map_err(MapperError::Marshal)
    }

    pub fn as_store_egress_policies(&self, bytes: &[u8]) -> Result<Vec<EgressPolicy>, MapperError> {
        let payload: EgressPoliciesPayload = serde_json::from_slice(bytes).map_err(MapperError::Unmarshal)?;

        let validation = |source: ValidationError| MapperError::Validation {
            subject: "egress policies",
            source,
        };

        self.validator
            .validate_egress_policies(&payload.egress_policies)
            .map_err(validation)?;

        payload
            .egress_policies
            .into_iter()
            .map(|policy| {
                let source_type: SourceType = policy.source.source_type.parse().map_err(ValidationError)?;
                let source = EgressSource {
                    source_type,
                    id: policy.source.id,
                    terminal_guid: String::new(),
                };
                Ok(EgressPolicy::new(source, policy.destination.id))
            })
            .collect::<Result<_, ValidationError>>()
            .map_err(validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::destination::{EgressDestination, IpRange, Protocol};
    use crate::presentation::validator::PayloadValidator;
    use serde_json::{json, Value};

    fn mapper() -> EgressPolicyMapper {
        EgressPolicyMapper::new(Arc::new(PayloadValidator))
    }

    #[test]
    fn test_as_store_egress_policies() {
        let payload = json!({
            "egress_policies": [
                {"source": {"id": "app-guid"}, "destination": {"id": "dest-1"}},
                {"source": {"type": "space", "id": "space-guid"}, "destination": {"id": "dest-2"}}
            ]
        });

        let policies = mapper()
            .as_store_egress_policies(payload.to_string().as_bytes())
            .unwrap();

        assert_eq!(policies.len(), 2);
        assert_eq!(policies[0].source, EgressSource::app("app-guid"));
        assert_eq!(policies[0].destination.guid, "dest-1");
        assert_eq!(policies[1].source, EgressSource::space("space-guid"));
        assert!(policies[1].guid.is_empty());
    }

    #[test]
    fn test_as_bytes_renders_destination() {
        let mut destination = EgressDestination::new("mynet", Protocol::Tcp, IpRange::new("10.0.0.1", "10.0.0.2"))
            .with_ports(443, 443);
        destination.guid = "dest-guid".to_string();
        let policy = EgressPolicy {
            guid: "policy-guid".to_string(),
            source: EgressSource::app("app-guid"),
            destination,
        };

        let bytes = mapper().as_bytes(&[policy]).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["total_egress_policies"], json!(1));
        let rendered = &value["egress_policies"][0];
        assert_eq!(rendered["id"], json!("policy-guid"));
        assert_eq!(rendered["source"], json!({"type": "app", "id": "app-guid"}));
        assert_eq!(rendered["destination"]["id"], json!("dest-guid"));
        assert_eq!(rendered["destination"]["ports"], json!([{"start": 443, "end": 443}]));
        assert!(rendered["destination"].get("icmp_type").is_none());
    }

    #[test]
    fn test_validation_error() {
        let err = mapper()
            .as_store_egress_policies(br#"{"egress_policies": [{"source": {"id": ""}, "destination": {"id": "d"}}]}"#)
            .unwrap_err();

        assert_eq!(err.to_string(), "validate egress policies: missing egress policy source id");
    }
}
