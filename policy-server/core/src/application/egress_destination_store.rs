// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Egress Destination Store
//!
//! Transactional entry point for egress destinations. A destination spans
//! three tables (terminal, metadata, IP range); every method here runs its
//! statements in a single transaction so callers only ever see whole
//! destinations.
//!
//! ## Ordering
//!
//! - create: terminal → metadata → IP range
//! - delete: IP range → metadata → terminal
//!
//! Terminal deletion is last because it is where the database refuses to drop
//! a destination that an egress policy still references. That refusal is
//! reported as [`StoreError::ForeignKey`] and the whole delete is rolled back.
//!
//! ## Batches
//!
//! `create` and `update` take a batch. A failure on any entry discards the
//! effects of the entries before it as well.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::transaction::{begin, finish, rollback, timed};
use crate::domain::destination::EgressDestination;
use crate::domain::repository::{
    DestinationMetadataRepository, EgressDestinationRepository, IpRangeRecord, StoreError,
    TerminalsRepository, TransactionProvider, Tx,
};
use crate::infrastructure::db::Dialect;
use crate::infrastructure::db_errors::{is_duplicate_error, is_foreign_key_error};

const STORE: &str = "egress_destination";

pub struct EgressDestinationStore {
    conn: Arc<dyn TransactionProvider>,
    egress_destination_repo: Arc<dyn EgressDestinationRepository>,
    terminals_repo: Arc<dyn TerminalsRepository>,
    destination_metadata_repo: Arc<dyn DestinationMetadataRepository>,
}

impl EgressDestinationStore {
    pub fn new(
        conn: Arc<dyn TransactionProvider>,
        egress_destination_repo: Arc<dyn EgressDestinationRepository>,
        terminals_repo: Arc<dyn TerminalsRepository>,
        destination_metadata_repo: Arc<dyn DestinationMetadataRepository>,
    ) -> Self {
        Self {
            conn,
            egress_destination_repo,
            terminals_repo,
            destination_metadata_repo,
        }
    }

    pub async fn get_by_guid(&self, guids: &[String]) -> Result<Vec<EgressDestination>, StoreError> {
        timed(STORE, "get_by_guid", async {
            let (mut tx, _) = begin(self.conn.as_ref(), "egress destination store get transaction").await?;

            let result = self
                .egress_destination_repo
                .get_by_guid(&mut tx, guids)
                .await
                .map_err(|source| StoreError::Database {
                    operation: "egress destination store get destinations by guid",
                    source,
                });

            rollback(tx, "egress destination store get transaction").await;
            result
        })
        .await
    }

    /// Every destination, most recently created first.
    pub async fn all(&self) -> Result<Vec<EgressDestination>, StoreError> {
        timed(STORE, "all", async {
            let (mut tx, _) = begin(self.conn.as_ref(), "egress destination store all transaction").await?;

            let result = self
                .egress_destination_repo
                .all(&mut tx)
                .await
                .map_err(|source| StoreError::Database {
                    operation: "egress destination store list destinations",
                    source,
                });

            rollback(tx, "egress destination store all transaction").await;
            result
        })
        .await
    }

    /// Creates every destination in `destinations` or none of them. Returns
    /// the inputs with `guid` set to their new terminal GUID.
    pub async fn create(
        &self,
        destinations: Vec<EgressDestination>,
    ) -> Result<Vec<EgressDestination>, StoreError> {
        let created = timed(STORE, "create", async {
            let (mut tx, dialect) =
                begin(self.conn.as_ref(), "egress destination store create transaction").await?;

            let result = self.create_in(&mut tx, dialect, destinations).await;
            finish(tx, result, "egress destination store commit transaction").await
        })
        .await?;

        info!(count = created.len(), "Created egress destinations");
        Ok(created)
    }

    async fn create_in(
        &self,
        tx: &mut Tx,
        dialect: Dialect,
        destinations: Vec<EgressDestination>,
    ) -> Result<Vec<EgressDestination>, StoreError> {
        let mut results = Vec::with_capacity(destinations.len());

        for mut destination in destinations {
            if destination.ip_ranges.is_empty() {
                return Err(StoreError::InvalidRecord(format!(
                    "egress destination '{}' has no ip range",
                    destination.name
                )));
            }

            let terminal_guid = self.terminals_repo.create(tx).await.map_err(|source| {
                StoreError::Database {
                    operation: "egress destination store create terminal",
                    source,
                }
            })?;

            self.destination_metadata_repo
                .create(tx, &terminal_guid, &destination.name, &destination.description)
                .await
                .map_err(|source| {
                    metadata_error(
                        dialect,
                        "egress destination store create destination metadata",
                        &destination.name,
                        source,
                    )
                })?;

            let record = ip_range_record(&terminal_guid, &destination)?;
            self.egress_destination_repo
                .create_ip_range(tx, &record)
                .await
                .map_err(|source| StoreError::Database {
                    operation: "egress destination store create ip range",
                    source,
                })?;

            debug!(guid = %terminal_guid, name = %destination.name, "Created egress destination");
            destination.guid = terminal_guid;
            results.push(destination);
        }

        Ok(results)
    }

    /// Updates metadata and match criteria of existing destinations in place.
    /// Terminal GUIDs never change.
    pub async fn update(
        &self,
        destinations: Vec<EgressDestination>,
    ) -> Result<Vec<EgressDestination>, StoreError> {
        timed(STORE, "update", async {
            let (mut tx, dialect) =
                begin(self.conn.as_ref(), "egress destination store update transaction").await?;

            let result = self.update_in(&mut tx, dialect, &destinations).await;
            finish(tx, result, "egress destination store update commit transaction").await
        })
        .await?;

        info!(count = destinations.len(), "Updated egress destinations");
        Ok(destinations)
    }

    async fn update_in(
        &self,
        tx: &mut Tx,
        dialect: Dialect,
        destinations: &[EgressDestination],
    ) -> Result<(), StoreError> {
        for destination in destinations {
            self.destination_metadata_repo
                .update(tx, &destination.guid, &destination.name, &destination.description)
                .await
                .map_err(|source| {
                    metadata_error(
                        dialect,
                        "egress destination store update metadata",
                        &destination.name,
                        source,
                    )
                })?;

            let record = ip_range_record(&destination.guid, destination)?;
            self.egress_destination_repo
                .update_ip_range(tx, &record)
                .await
                .map_err(|source| StoreError::Database {
                    operation: "egress destination store update iprange",
                    source,
                })?;
        }

        Ok(())
    }

    /// Deletes one destination and returns what was deleted.
    ///
    /// An unknown `guid` is not an error: the result is the zero-value
    /// destination (see [`EgressDestination::is_empty`]).
    pub async fn delete(&self, guid: &str) -> Result<EgressDestination, StoreError> {
        let deleted = timed(STORE, "delete", async {
            let (mut tx, dialect) =
                begin(self.conn.as_ref(), "egress destination store delete transaction").await?;

            let result = self.delete_in(&mut tx, dialect, guid).await;
            finish(tx, result, "egress destination store delete destination commit").await
        })
        .await?;

        if deleted.is_empty() {
            warn!(guid, "No egress destination found to delete");
        } else {
            info!(guid, name = %deleted.name, "Deleted egress destination");
        }
        Ok(deleted)
    }

    async fn delete_in(
        &self,
        tx: &mut Tx,
        dialect: Dialect,
        guid: &str,
    ) -> Result<EgressDestination, StoreError> {
        let destinations = self
            .egress_destination_repo
            .get_by_guid(tx, &[guid.to_string()])
            .await
            .map_err(|source| StoreError::Database {
                operation: "egress destination store get destination by guid",
                source,
            })?;

        self.egress_destination_repo
            .delete(tx, guid)
            .await
            .map_err(|source| StoreError::Database {
                operation: "egress destination store delete destination",
                source,
            })?;

        self.destination_metadata_repo
            .delete(tx, guid)
            .await
            .map_err(|source| StoreError::Database {
                operation: "egress destination store delete destination metadata",
                source,
            })?;

        self.terminals_repo.delete(tx, guid).await.map_err(|source| {
            let operation = "egress destination store delete destination terminal";
            if is_foreign_key_error(dialect, &source) {
                StoreError::ForeignKey { operation, source }
            } else {
                StoreError::Database { operation, source }
            }
        })?;

        Ok(destinations.into_iter().next().unwrap_or_default())
    }
}

fn ip_range_record(terminal_guid: &str, destination: &EgressDestination) -> Result<IpRangeRecord, StoreError> {
    IpRangeRecord::from_destination(terminal_guid, destination).ok_or_else(|| {
        StoreError::InvalidRecord(format!(
            "egress destination '{}' has no ip range",
            destination.name
        ))
    })
}

fn metadata_error(
    dialect: Dialect,
    operation: &'static str,
    name: &str,
    source: sqlx::Error,
) -> StoreError {
    if is_duplicate_error(dialect, &source) {
        StoreError::DuplicateName {
            operation,
            name: name.to_string(),
            source,
        }
    } else {
        StoreError::Database { operation, source }
    }
}
