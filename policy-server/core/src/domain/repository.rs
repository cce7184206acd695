// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Repository Interfaces
//!
//! Persistence contracts for the policy store. Every repository operation runs
//! inside a transaction owned by the caller (one of the stores in
//! `crate::application`); repositories never begin, commit or roll back.
//!
//! | Trait | Tables | Implementation |
//! |-------|--------|----------------|
//! | `TerminalsRepository` | `terminals` | `TerminalsTable` |
//! | `DestinationMetadataRepository` | `destination_metadatas` | `DestinationMetadataTable` |
//! | `EgressDestinationRepository` | `ip_ranges` (+ joins) | `EgressDestinationTable` |
//! | `EgressPolicyRepository` | `egress_policies`, `apps`, `spaces` | `EgressPolicyTable` |
//!
//! Repositories return `sqlx::Error` unmodified. Turning backend constraint
//! violations into domain errors is the store's job, because only the store
//! knows which entry and which operation caused them.

use async_trait::async_trait;

use crate::domain::destination::EgressDestination;
use crate::domain::egress_policy::EgressSource;

/// A transaction on whichever SQL engine the pool was opened against.
pub type Tx = sqlx::Transaction<'static, sqlx::Any>;

/// Hands out transactions. Pooling, retries and TLS live behind this.
#[async_trait]
pub trait TransactionProvider: Send + Sync {
    async fn begin(&self) -> Result<Tx, sqlx::Error>;
}

pub trait GuidGenerator: Send + Sync {
    fn new_guid(&self) -> String;
}

/// Anchor rows. Terminals are immutable once created, so there is no update.
#[async_trait]
pub trait TerminalsRepository: Send + Sync {
    async fn create(&self, tx: &mut Tx) -> Result<String, sqlx::Error>;

    /// Fails with the backend's foreign key error while anything still
    /// references the terminal.
    async fn delete(&self, tx: &mut Tx, guid: &str) -> Result<(), sqlx::Error>;
}

#[async_trait]
pub trait DestinationMetadataRepository: Send + Sync {
    async fn create(
        &self,
        tx: &mut Tx,
        terminal_guid: &str,
        name: &str,
        description: &str,
    ) -> Result<i64, sqlx::Error>;

    /// Fails with `sqlx::Error::RowNotFound` when no metadata row exists.
    async fn update(
        &self,
        tx: &mut Tx,
        terminal_guid: &str,
        name: &str,
        description: &str,
    ) -> Result<(), sqlx::Error>;

    /// Succeeds when no row matched: destinations created before the metadata
    /// table existed have none.
    async fn delete(&self, tx: &mut Tx, terminal_guid: &str) -> Result<(), sqlx::Error>;
}

/// Column values of one `ip_ranges` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpRangeRecord {
    pub terminal_guid: String,
    pub start_ip: String,
    pub end_ip: String,
    pub protocol: String,
    pub start_port: i64,
    pub end_port: i64,
    pub icmp_type: i64,
    pub icmp_code: i64,
}

impl IpRangeRecord {
    /// Flattens the persisted parts of `destination`: first IP range, first
    /// port range (or `0..0`) and the ICMP fields. `None` when the destination
    /// carries no IP range.
    pub fn from_destination(terminal_guid: &str, destination: &EgressDestination) -> Option<Self> {
        let ip_range = destination.ip_ranges.first()?;
        let (start_port, end_port) = destination.port_bounds();
        Some(Self {
            terminal_guid: terminal_guid.to_string(),
            start_ip: ip_range.start.clone(),
            end_ip: ip_range.end.clone(),
            protocol: destination.protocol.as_str().to_string(),
            start_port,
            end_port,
            icmp_type: i64::from(destination.icmp_type),
            icmp_code: i64::from(destination.icmp_code),
        })
    }
}

#[async_trait]
pub trait EgressDestinationRepository: Send + Sync {
    /// Every destination, most recently created terminal first.
    async fn all(&self, tx: &mut Tx) -> Result<Vec<EgressDestination>, sqlx::Error>;

    async fn create_ip_range(&self, tx: &mut Tx, record: &IpRangeRecord) -> Result<i64, sqlx::Error>;

    async fn update_ip_range(&self, tx: &mut Tx, record: &IpRangeRecord) -> Result<(), sqlx::Error>;

    /// Unknown GUIDs are skipped, so the result may be shorter than `guids`.
    async fn get_by_guid(
        &self,
        tx: &mut Tx,
        guids: &[String],
    ) -> Result<Vec<EgressDestination>, sqlx::Error>;

    /// Removes the IP range row only.
    async fn delete(&self, tx: &mut Tx, terminal_guid: &str) -> Result<(), sqlx::Error>;
}

/// One `egress_policies` row joined with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EgressPolicyRecord {
    pub guid: String,
    pub source: EgressSource,
    pub destination_guid: String,
}

#[async_trait]
pub trait EgressPolicyRepository: Send + Sync {
    /// Terminal GUID already anchoring this app or space, if any.
    async fn source_terminal(
        &self,
        tx: &mut Tx,
        source: &EgressSource,
    ) -> Result<Option<String>, sqlx::Error>;

    /// Inserts the `apps` or `spaces` row tying `source.id` to a terminal.
    async fn create_source(
        &self,
        tx: &mut Tx,
        terminal_guid: &str,
        source: &EgressSource,
    ) -> Result<i64, sqlx::Error>;

    async fn delete_source(&self, tx: &mut Tx, source: &EgressSource) -> Result<(), sqlx::Error>;

    /// Returns the GUID of the new policy.
    async fn create_policy(
        &self,
        tx: &mut Tx,
        source_terminal_guid: &str,
        destination_terminal_guid: &str,
    ) -> Result<String, sqlx::Error>;

    /// Every policy, oldest first.
    async fn all(&self, tx: &mut Tx) -> Result<Vec<EgressPolicyRecord>, sqlx::Error>;

    async fn get_by_guid(
        &self,
        tx: &mut Tx,
        guids: &[String],
    ) -> Result<Vec<EgressPolicyRecord>, sqlx::Error>;

    async fn delete_policy(&self, tx: &mut Tx, guid: &str) -> Result<(), sqlx::Error>;

    /// Number of policies whose source is `terminal_guid`.
    async fn count_by_source(&self, tx: &mut Tx, terminal_guid: &str) -> Result<i64, sqlx::Error>;
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Begin or commit failed.
    #[error("{operation}: {source}")]
    Transaction {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{operation}: duplicate name error: entry with name '{name}' already exists")]
    DuplicateName {
        operation: &'static str,
        name: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("{operation}: foreign key error: {source}")]
    ForeignKey {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

impl StoreError {
    pub fn is_duplicate_name(&self) -> bool {
        matches!(self, StoreError::DuplicateName { .. })
    }

    pub fn is_foreign_key(&self) -> bool {
        matches!(self, StoreError::ForeignKey { .. })
    }
}
