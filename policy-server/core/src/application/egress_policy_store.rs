// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Egress Policy Store
//!
//! Egress policies connect a source (an app or a space, each anchored by its
//! own terminal) to an egress destination terminal. Source terminals are
//! shared between every policy of the same app or space and are removed once
//! the last such policy is deleted.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::application::transaction::{begin, finish, rollback, timed};
use crate::domain::destination::EgressDestination;
use crate::domain::egress_policy::{EgressPolicy, EgressSource};
use crate::domain::repository::{
    EgressDestinationRepository, EgressPolicyRecord, EgressPolicyRepository, StoreError,
    TerminalsRepository, TransactionProvider, Tx,
};
use crate::infrastructure::db::Dialect;
use crate::infrastructure::db_errors::is_foreign_key_error;

const STORE: &str = "egress_policy";

pub struct EgressPolicyStore {
    conn: Arc<dyn TransactionProvider>,
    egress_policy_repo: Arc<dyn EgressPolicyRepository>,
    egress_destination_repo: Arc<dyn EgressDestinationRepository>,
    terminals_repo: Arc<dyn TerminalsRepository>,
}

impl EgressPolicyStore {
    pub fn new(
        conn: Arc<dyn TransactionProvider>,
        egress_policy_repo: Arc<dyn EgressPolicyRepository>,
        egress_destination_repo: Arc<dyn EgressDestinationRepository>,
        terminals_repo: Arc<dyn TerminalsRepository>,
    ) -> Self {
        Self {
            conn,
            egress_policy_repo,
            egress_destination_repo,
            terminals_repo,
        }
    }

    /// Creates every policy or none. Returned policies carry their new GUID,
    /// the source terminal and the fully populated destination.
    pub async fn create(&self, policies: Vec<EgressPolicy>) -> Result<Vec<EgressPolicy>, StoreError> {
        let created = timed(STORE, "create", async {
            let (mut tx, dialect) = begin(self.conn.as_ref(), "egress policy store create transaction").await?;

            let result = self.create_in(&mut tx, dialect, policies).await;
            finish(tx, result, "egress policy store commit transaction").await
        })
        .await?;

        info!(count = created.len(), "Created egress policies");
        Ok(created)
    }

    async fn create_in(
        &self,
        tx: &mut Tx,
        dialect: Dialect,
        policies: Vec<EgressPolicy>,
    ) -> Result<Vec<EgressPolicy>, StoreError> {
        let mut results = Vec::with_capacity(policies.len());

        for mut policy in policies {
            let source_terminal = self.ensure_source(tx, &policy.source).await?;
            let destination_guid = policy.destination.guid.clone();

            let guid = self
                .egress_policy_repo
                .create_policy(tx, &source_terminal, &destination_guid)
                .await
                .map_err(|source| {
                    let operation = "egress policy store create policy";
                    if is_foreign_key_error(dialect, &source) {
                        StoreError::ForeignKey { operation, source }
                    } else {
                        StoreError::Database { operation, source }
                    }
                })?;

            let destination = self
                .egress_destination_repo
                .get_by_guid(tx, &[destination_guid.clone()])
                .await
                .map_err(|source| StoreError::Database {
                    operation: "egress policy store get destination",
                    source,
                })?
                .into_iter()
                .next()
                .ok_or_else(|| {
                    StoreError::InvalidRecord(format!(
                        "egress policy destination '{}' is not an egress destination",
                        destination_guid
                    ))
                })?;

            debug!(guid = %guid, source = %policy.source.id, destination = %destination_guid, "Created egress policy");
            policy.guid = guid;
            policy.source.terminal_guid = source_terminal;
            policy.destination = destination;
            results.push(policy);
        }

        Ok(results)
    }

    /// Terminal anchoring `source`, created together with its app/space row
    /// on first use.
    async fn ensure_source(&self, tx: &mut Tx, source: &EgressSource) -> Result<String, StoreError> {
        let existing = self
            .egress_policy_repo
            .source_terminal(tx, source)
            .await
            .map_err(|source| StoreError::Database {
                operation: "egress policy store find source",
                source,
            })?;
        if let Some(terminal_guid) = existing {
            return Ok(terminal_guid);
        }

        let terminal_guid = self.terminals_repo.create(tx).await.map_err(|source| {
            StoreError::Database {
                operation: "egress policy store create source terminal",
                source,
            }
        })?;

        self.egress_policy_repo
            .create_source(tx, &terminal_guid, source)
            .await
            .map_err(|source| StoreError::Database {
                operation: "egress policy store create source",
                source,
            })?;

        Ok(terminal_guid)
    }

    /// Every policy, oldest first.
    pub async fn all(&self) -> Result<Vec<EgressPolicy>, StoreError> {
        timed(STORE, "all", async {
            let (mut tx, _) = begin(self.conn.as_ref(), "egress policy store all transaction").await?;

            let result = match self.egress_policy_repo.all(&mut tx).await {
                Ok(records) => self.with_destinations(&mut tx, records).await,
                Err(source) => Err(StoreError::Database {
                    operation: "egress policy store list policies",
                    source,
                }),
            };

            rollback(tx, "egress policy store all transaction").await;
            result
        })
        .await
    }

    /// Unknown GUIDs are skipped.
    pub async fn get_by_guid(&self, guids: &[String]) -> Result<Vec<EgressPolicy>, StoreError> {
        timed(STORE, "get_by_guid", async {
            let (mut tx, _) = begin(self.conn.as_ref(), "egress policy store get transaction").await?;

            let result = self.get_in(&mut tx, guids).await;

            rollback(tx, "egress policy store get transaction").await;
            result
        })
        .await
    }

    async fn get_in(&self, tx: &mut Tx, guids: &[String]) -> Result<Vec<EgressPolicy>, StoreError> {
        let records = self
            .egress_policy_repo
            .get_by_guid(tx, guids)
            .await
            .map_err(|source| StoreError::Database {
                operation: "egress policy store get policies by guid",
                source,
            })?;
        self.with_destinations(tx, records).await
    }

    /// Deletes the policies named by `guids` and any app/space source left
    /// without policies. Returns the deleted policies.
    pub async fn delete(&self, guids: &[String]) -> Result<Vec<EgressPolicy>, StoreError> {
        let deleted = timed(STORE, "delete", async {
            let (mut tx, dialect) = begin(self.conn.as_ref(), "egress policy store delete transaction").await?;

            let result = self.delete_in(&mut tx, dialect, guids).await;
            finish(tx, result, "egress policy store delete commit").await
        })
        .await?;

        info!(count = deleted.len(), "Deleted egress policies");
        Ok(deleted)
    }

    async fn delete_in(
        &self,
        tx: &mut Tx,
        dialect: Dialect,
        guids: &[String],
    ) -> Result<Vec<EgressPolicy>, StoreError> {
        let policies = self.get_in(tx, guids).await?;

        for policy in &policies {
            self.egress_policy_repo
                .delete_policy(tx, &policy.guid)
                .await
                .map_err(|source| StoreError::Database {
                    operation: "egress policy store delete policy",
                    source,
                })?;
        }

        let mut orphaned: Vec<&EgressSource> = Vec::new();
        for policy in &policies {
            let source = &policy.source;
            if orphaned.iter().any(|s| s.terminal_guid == source.terminal_guid) {
                continue;
            }
            let remaining = self
                .egress_policy_repo
                .count_by_source(tx, &source.terminal_guid)
                .await
                .map_err(|source| StoreError::Database {
                    operation: "egress policy store count source policies",
                    source,
                })?;
            if remaining == 0 {
                orphaned.push(source);
            }
        }

        for source in orphaned {
            self.egress_policy_repo
                .delete_source(tx, source)
                .await
                .map_err(|source| StoreError::Database {
                    operation: "egress policy store delete source",
                    source,
                })?;

            self.terminals_repo
                .delete(tx, &source.terminal_guid)
                .await
                .map_err(|e| {
                    let operation = "egress policy store delete source terminal";
                    if is_foreign_key_error(dialect, &e) {
                        StoreError::ForeignKey { operation, source: e }
                    } else {
                        StoreError::Database { operation, source: e }
                    }
                })?;
            debug!(source = %source.id, terminal = %source.terminal_guid, "Removed egress policy source");
        }

        Ok(policies)
    }

    async fn with_destinations(
        &self,
        tx: &mut Tx,
        records: Vec<EgressPolicyRecord>,
    ) -> Result<Vec<EgressPolicy>, StoreError> {
        let mut destination_guids: Vec<String> = records.iter().map(|r| r.destination_guid.clone()).collect();
        destination_guids.sort();
        destination_guids.dedup();

        let destinations: HashMap<String, EgressDestination> = self
            .egress_destination_repo
            .get_by_guid(tx, &destination_guids)
            .await
            .map_err(|source| StoreError::Database {
                operation: "egress policy store get destinations",
                source,
            })?
            .into_iter()
            .map(|d| (d.guid.clone(), d))
            .collect();

        Ok(records
            .into_iter()
            .map(|record| {
                let destination = destinations.get(&record.destination_guid).cloned().unwrap_or_else(|| {
                    EgressDestination {
                        guid: record.destination_guid.clone(),
                        ..Default::default()
                    }
                });
                EgressPolicy {
                    guid: record.guid,
                    source: record.source,
                    destination,
                }
            })
            .collect())
    }
}
