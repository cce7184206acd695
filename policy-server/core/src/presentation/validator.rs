// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Payload validation
//!
//! Business rules checked on decoded wire payloads before anything is
//! converted or written. The mappers only see the validator traits.

use std::net::Ipv4Addr;

use crate::domain::destination::Protocol;
use crate::domain::egress_policy::SourceType;
use crate::presentation::wire::{WireDestination, WireEgressPolicy};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub trait EgressDestinationsValidator: Send + Sync {
    fn validate_egress_destinations(&self, destinations: &[WireDestination]) -> Result<(), ValidationError>;
}

pub trait EgressPoliciesValidator: Send + Sync {
    fn validate_egress_policies(&self, policies: &[WireEgressPolicy]) -> Result<(), ValidationError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadValidator;

impl EgressDestinationsValidator for PayloadValidator {
    fn validate_egress_destinations(&self, destinations: &[WireDestination]) -> Result<(), ValidationError> {
        if destinations.is_empty() {
            return Err(ValidationError::new("missing destinations"));
        }
        destinations.iter().try_for_each(validate_destination)
    }
}

impl EgressPoliciesValidator for PayloadValidator {
    fn validate_egress_policies(&self, policies: &[WireEgressPolicy]) -> Result<(), ValidationError> {
        if policies.is_empty() {
            return Err(ValidationError::new("missing egress policies"));
        }

        for policy in policies {
            if policy.source.id.is_empty() {
                return Err(ValidationError::new("missing egress policy source id"));
            }
            policy
                .source
                .source_type
                .parse::<SourceType>()
                .map_err(ValidationError)?;
            if policy.destination.id.is_empty() {
                return Err(ValidationError::new("missing egress policy destination id"));
            }
        }
        Ok(())
    }
}

fn validate_destination(destination: &WireDestination) -> Result<(), ValidationError> {
    if destination.name.is_empty() {
        return Err(ValidationError::new("missing destination name"));
    }
    let name = &destination.name;

    let protocol: Protocol = destination
        .protocol
        .parse()
        .map_err(|e| ValidationError::new(format!("destination '{}': {}", name, e)))?;

    match destination.ips.as_slice() {
        [range] => {
            let start = parse_ip(name, &range.start)?;
            let end = parse_ip(name, &range.end)?;
            if start > end {
                return Err(ValidationError::new(format!(
                    "destination '{}': ip range start {} is greater than end {}",
                    name, start, end
                )));
            }
        }
        _ => {
            return Err(ValidationError::new(format!(
                "destination '{}': exactly one ip range is required",
                name
            )))
        }
    }

    if !destination.ports.is_empty() {
        if !protocol.has_ports() {
            return Err(ValidationError::new(format!(
                "destination '{}': ports are only valid for tcp and udp",
                name
            )));
        }
        if destination.ports.len() > 1 {
            return Err(ValidationError::new(format!(
                "destination '{}': at most one port range is supported",
                name
            )));
        }
        let ports = destination.ports[0];
        if ports.start < 1 || ports.end > 65535 || ports.start > ports.end {
            return Err(ValidationError::new(format!(
                "destination '{}': invalid port range {}-{}",
                name, ports.start, ports.end
            )));
        }
    }

    let has_icmp = destination.icmp_type.is_some() || destination.icmp_code.is_some();
    if has_icmp && protocol != Protocol::Icmp {
        return Err(ValidationError::new(format!(
            "destination '{}': icmp_type and icmp_code are only valid for icmp",
            name
        )));
    }
    for (field, value) in [("icmp_type", destination.icmp_type), ("icmp_code", destination.icmp_code)] {
        if let Some(v) = value {
            if !(-1..=255).contains(&v) {
                return Err(ValidationError::new(format!(
                    "destination '{}': {} {} out of range",
                    name, field, v
                )));
            }
        }
    }

    Ok(())
}

fn parse_ip(name: &str, ip: &str) -> Result<Ipv4Addr, ValidationError> {
    ip.parse()
        .map_err(|_| ValidationError::new(format!("destination '{}': invalid ip address '{}'", name, ip)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::wire::{WireEgressSource, WireIpRange, WirePorts};

    fn tcp_destination() -> WireDestination {
        WireDestination {
            name: "mynet".to_string(),
            protocol: "tcp".to_string(),
            ips: vec![WireIpRange {
                start: "10.0.0.1".to_string(),
                end: "10.0.0.10".to_string(),
            }],
            ports: vec![WirePorts { start: 80, end: 443 }],
            ..Default::default()
        }
    }

    fn check(destination: WireDestination) -> Result<(), ValidationError> {
        PayloadValidator.validate_egress_destinations(&[destination])
    }

    #[test]
    fn test_accepts_valid_destination() {
        assert!(check(tcp_destination()).is_ok());
    }

    #[test]
    fn test_rejects_empty_list() {
        let err = PayloadValidator.validate_egress_destinations(&[]).unwrap_err();
        assert_eq!(err.to_string(), "missing destinations");
    }

    #[test]
    fn test_rejects_missing_name() {
        let mut d = tcp_destination();
        d.name.clear();
        assert_eq!(check(d).unwrap_err().to_string(), "missing destination name");
    }

    #[test]
    fn test_rejects_unknown_protocol() {
        let mut d = tcp_destination();
        d.protocol = "sctp".to_string();
        assert!(check(d).unwrap_err().to_string().contains("unknown protocol"));
    }

    #[test]
    fn test_rejects_inverted_ip_range() {
        let mut d = tcp_destination();
        d.ips[0] = WireIpRange {
            start: "10.0.0.10".to_string(),
            end: "10.0.0.1".to_string(),
        };
        assert!(check(d).unwrap_err().to_string().contains("greater than end"));
    }

    #[test]
    fn test_rejects_bad_ip_and_range_count() {
        let mut d = tcp_destination();
        d.ips[0].start = "not-an-ip".to_string();
        assert!(check(d).unwrap_err().to_string().contains("invalid ip address"));

        let mut d = tcp_destination();
        d.ips.clear();
        assert!(check(d).unwrap_err().to_string().contains("exactly one ip range"));
    }

    #[test]
    fn test_port_rules() {
        let mut d = tcp_destination();
        d.ports = vec![WirePorts { start: 0, end: 80 }];
        assert!(check(d).is_err());

        let mut d = tcp_destination();
        d.ports = vec![WirePorts { start: 80, end: 70000 }];
        assert!(check(d).is_err());

        let mut d = tcp_destination();
        d.ports.push(WirePorts { start: 8080, end: 8080 });
        assert!(check(d).unwrap_err().to_string().contains("at most one"));

        let mut d = tcp_destination();
        d.protocol = "icmp".to_string();
        assert!(check(d).unwrap_err().to_string().contains("only valid for tcp and udp"));
    }

    #[test]
    fn test_icmp_rules() {
        let mut d = tcp_destination();
        d.ports.clear();
        d.icmp_type = Some(8);
        assert!(check(d.clone()).unwrap_err().to_string().contains("only valid for icmp"));

        d.protocol = "icmp".to_string();
        assert!(check(d.clone()).is_ok());

        d.icmp_code = Some(256);
        assert!(check(d).unwrap_err().to_string().contains("icmp_code 256 out of range"));
    }

    #[test]
    fn test_policy_rules() {
        let policy = WireEgressPolicy {
            source: WireEgressSource {
                source_type: String::new(),
                id: "app-guid".to_string(),
            },
            destination: WireDestination {
                id: "dest-guid".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(PayloadValidator.validate_egress_policies(&[policy.clone()]).is_ok());

        let mut bad = policy.clone();
        bad.source.source_type = "org".to_string();
        assert!(PayloadValidator.validate_egress_policies(&[bad]).is_err());

        let mut bad = policy.clone();
        bad.destination.id.clear();
        assert!(PayloadValidator.validate_egress_policies(&[bad]).is_err());

        assert!(PayloadValidator.validate_egress_policies(&[]).is_err());
    }
}
