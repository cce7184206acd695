// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer
//!
//! JSON wire schema and the mappers that translate it to and from store
//! entities. Validation runs before conversion, so a rejected payload never
//! reaches a store.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`wire`] | Serde types for destination and egress policy envelopes |
//! | [`validator`] | Business rules for decoded payloads |
//! | [`egress_destination_mapper`] | Destinations envelope ↔ `EgressDestination` |
//! | [`egress_policy_mapper`] | Egress policies envelope ↔ `EgressPolicy` |

pub mod egress_destination_mapper;
pub mod egress_policy_mapper;
pub mod validator;
pub mod wire;

pub use egress_destination_mapper::EgressDestinationMapper;
pub use egress_policy_mapper::EgressPolicyMapper;
pub use validator::{EgressDestinationsValidator, EgressPoliciesValidator, PayloadValidator, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    #[error("unmarshal json: {0}")]
    Unmarshal(#[source] serde_json::Error),

    #[error("validate {subject}: {source}")]
    Validation {
        subject: &'static str,
        #[source]
        source: ValidationError,
    },

    #[error("marshal json: {0}")]
    Marshal(#[source] serde_json::Error),
}
