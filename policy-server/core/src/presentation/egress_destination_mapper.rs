// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Egress Destination Mapper
//!
//! Converts between the destinations envelope on the wire and store-side
//! [`EgressDestination`]s.
//!
//! ICMP type and code are optional on the wire and concrete in the store.
//! Missing values become [`ICMP_DEFAULT`] on the way in; on the way out they
//! are written only for `icmp` destinations, so the default never appears in
//! the output of a tcp, udp or all destination.

use std::sync::Arc;

use crate::domain::destination::{EgressDestination, IpRange, PortRange, Protocol, ICMP_DEFAULT};
use crate::presentation::validator::{EgressDestinationsValidator, ValidationError};
use crate::presentation::wire::{DestinationsPayload, WireDestination, WireIpRange, WirePorts};
use crate::presentation::MapperError;

pub struct EgressDestinationMapper {
    validator: Arc<dyn EgressDestinationsValidator>,
}

impl EgressDestinationMapper {
    pub fn new(validator: Arc<dyn EgressDestinationsValidator>) -> Self {
        Self { validator }
    }

    /// Store → wire: a `{total_destinations, destinations}` envelope.
    pub fn as_bytes(&self, destinations: &[EgressDestination]) -> Result<Vec<u8>, MapperError> {
        let destinations: Vec<WireDestination> = destinations.iter().map(as_wire_destination).collect();
        let payload = DestinationsPayload {
            total_destinations: destinations.len(),
            destinations,
        };
        serde_json::to_vec(&payload).map_err(MapperError::Marshal)
    }

    /// Wire → store. Nothing is converted unless the whole payload validates.
    pub fn as_egress_destinations(&self, bytes: &[u8]) -> Result<Vec<EgressDestination>, MapperError> {
        let payload: DestinationsPayload = serde_json::from_slice(bytes).map_err(MapperError::Unmarshal)?;

        self.validator
            .validate_egress_destinations(&payload.destinations)
            .map_err(|source| MapperError::Validation {
                subject: "destinations",
                source,
            })?;

        payload
            .destinations
            .into_iter()
            .map(as_store_destination)
            .collect::<Result<_, _>>()
            .map_err(|source| MapperError::Validation {
                subject: "destinations",
                source,
            })
    }
}

pub(crate) fn as_wire_destination(destination: &EgressDestination) -> WireDestination {
    let (icmp_type, icmp_code) = match destination.protocol {
        Protocol::Icmp => (Some(destination.icmp_type), Some(destination.icmp_code)),
        _ => (None, None),
    };

    WireDestination {
        id: destination.guid.clone(),
        name: destination.name.clone(),
        description: destination.description.clone(),
        protocol: destination.protocol.as_str().to_string(),
        ips: destination
            .ip_ranges
            .first()
            .map(|r| WireIpRange {
                start: r.start.clone(),
                end: r.end.clone(),
            })
            .into_iter()
            .collect(),
        ports: destination
            .ports
            .first()
            .map(|p| WirePorts {
                start: i64::from(p.start),
                end: i64::from(p.end),
            })
            .into_iter()
            .collect(),
        icmp_type,
        icmp_code,
    }
}

fn as_store_destination(destination: WireDestination) -> Result<EgressDestination, ValidationError> {
    let protocol: Protocol = destination
        .protocol
        .parse()
        .map_err(|e| ValidationError(format!("destination '{}': {}", destination.name, e)))?;

    let ports = destination
        .ports
        .iter()
        .map(|p| {
            Ok(PortRange {
                start: to_port(&destination.name, p.start)?,
                end: to_port(&destination.name, p.end)?,
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    let (icmp_type, icmp_code) = match protocol {
        Protocol::Icmp => (
            destination.icmp_type.unwrap_or(ICMP_DEFAULT),
            destination.icmp_code.unwrap_or(ICMP_DEFAULT),
        ),
        _ => (ICMP_DEFAULT, ICMP_DEFAULT),
    };

    Ok(EgressDestination {
        guid: destination.id,
        name: destination.name,
        description: destination.description,
        protocol,
        ip_ranges: destination
            .ips
            .into_iter()
            .map(|r| IpRange::new(r.start, r.end))
            .collect(),
        ports,
        icmp_type,
        icmp_code,
    })
}

fn to_port(name: &str, value: i64) -> Result<u16, ValidationError> {
    u16::try_from(value).map_err(|_| ValidationError(format!("destination '{}': invalid port {}", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::validator::PayloadValidator;
    use serde_json::{json, Value};

    struct RejectAll;

    impl EgressDestinationsValidator for RejectAll {
        fn validate_egress_destinations(&self, _: &[WireDestination]) -> Result<(), ValidationError> {
            Err(ValidationError("banana".to_string()))
        }
    }

    fn mapper() -> EgressDestinationMapper {
        EgressDestinationMapper::new(Arc::new(PayloadValidator))
    }

    #[test]
    fn test_tcp_destination_round_trip() {
        let mut destination = EgressDestination::new("mynet", Protocol::Tcp, IpRange::new("10.0.0.1", "10.0.0.20"))
            .with_description("my network")
            .with_ports(8080, 8090);
        destination.guid = "some-guid".to_string();

        let mapper = mapper();
        let bytes = mapper.as_bytes(&[destination.clone()]).unwrap();
        let decoded = mapper.as_egress_destinations(&bytes).unwrap();

        assert_eq!(decoded, vec![destination]);
    }

    #[test]
    fn test_as_bytes_envelope() {
        let destination = EgressDestination::new("mynet", Protocol::Udp, IpRange::new("1.1.1.1", "1.1.1.1"));

        let bytes = mapper().as_bytes(&[destination]).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(
            value,
            json!({
                "total_destinations": 1,
                "destinations": [{
                    "name": "mynet",
                    "description": "",
                    "protocol": "udp",
                    "ips": [{"start": "1.1.1.1", "end": "1.1.1.1"}]
                }]
            })
        );
    }

    #[test]
    fn test_icmp_defaults_when_missing() {
        let payload = json!({
            "destinations": [{
                "name": "pingable",
                "protocol": "icmp",
                "ips": [{"start": "10.0.0.1", "end": "10.0.0.1"}]
            }]
        });

        let destinations = mapper()
            .as_egress_destinations(payload.to_string().as_bytes())
            .unwrap();

        assert_eq!(destinations[0].icmp_type, ICMP_DEFAULT);
        assert_eq!(destinations[0].icmp_code, ICMP_DEFAULT);
    }

    #[test]
    fn test_icmp_fields_only_written_for_icmp() {
        let icmp = EgressDestination::new("ping", Protocol::Icmp, IpRange::new("10.0.0.1", "10.0.0.1")).with_icmp(8, 0);
        let all = EgressDestination::new("everything", Protocol::All, IpRange::new("10.0.0.1", "10.0.0.1"));

        let bytes = mapper().as_bytes(&[icmp, all]).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["destinations"][0]["icmp_type"], json!(8));
        assert_eq!(value["destinations"][0]["icmp_code"], json!(0));
        assert!(value["destinations"][1].get("icmp_type").is_none());
        assert!(value["destinations"][1].get("icmp_code").is_none());
    }

    #[test]
    fn test_only_first_port_range_is_written() {
        let mut destination = EgressDestination::new("mynet", Protocol::Tcp, IpRange::new("10.0.0.1", "10.0.0.1"));
        destination.ports = vec![PortRange { start: 80, end: 80 }, PortRange { start: 443, end: 443 }];

        let bytes = mapper().as_bytes(&[destination]).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["destinations"][0]["ports"], json!([{"start": 80, "end": 80}]));
    }

    #[test]
    fn test_unmarshal_error() {
        let err = mapper().as_egress_destinations(b"%%%").unwrap_err();

        assert!(matches!(err, MapperError::Unmarshal(_)));
        assert!(err.to_string().starts_with("unmarshal json: "));
    }

    #[test]
    fn test_validation_error() {
        let mapper = EgressDestinationMapper::new(Arc::new(RejectAll));
        let err = mapper
            .as_egress_destinations(br#"{"destinations": []}"#)
            .unwrap_err();

        assert_eq!(err.to_string(), "validate destinations: banana");
    }
}
