// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Destination Metadata Table
//!
//! Name and description of an egress destination, one row per destination
//! terminal. `name` is unique; violating that surfaces as the engine's unique
//! constraint error, which the store reports as a duplicate name.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::repository::{DestinationMetadataRepository, Tx};
use crate::infrastructure::db::{execute_insert, insert_sql, rebind, Dialect};
use crate::infrastructure::repositories::row_exists;

#[derive(Debug, Clone, Copy, Default)]
pub struct DestinationMetadataTable;

impl DestinationMetadataTable {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DestinationMetadataRepository for DestinationMetadataTable {
    async fn create(
        &self,
        tx: &mut Tx,
        terminal_guid: &str,
        name: &str,
        description: &str,
    ) -> Result<i64, sqlx::Error> {
        let dialect = Dialect::of(tx)?;
        let sql = insert_sql(
            dialect,
            "INSERT INTO destination_metadatas (terminal_guid, name, description) VALUES (?, ?, ?)",
        );

        let query = sqlx::query(&sql)
            .bind(terminal_guid)
            .bind(name)
            .bind(description);

        execute_insert(tx, dialect, query).await
    }

    async fn update(
        &self,
        tx: &mut Tx,
        terminal_guid: &str,
        name: &str,
        description: &str,
    ) -> Result<(), sqlx::Error> {
        let dialect = Dialect::of(tx)?;
        let result = sqlx::query(&rebind(
            dialect,
            "UPDATE destination_metadatas SET name = ?, description = ? WHERE terminal_guid = ?",
        ))
        .bind(name)
        .bind(description)
        .bind(terminal_guid)
        .execute(&mut **tx)
        .await?;

        // MySQL counts changed rows, so an update to identical values reports 0
        if result.rows_affected() == 0
            && !row_exists(tx, dialect, "destination_metadatas", "terminal_guid", terminal_guid).await?
        {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn delete(&self, tx: &mut Tx, terminal_guid: &str) -> Result<(), sqlx::Error> {
        let dialect = Dialect::of(tx)?;
        let result = sqlx::query(&rebind(
            dialect,
            "DELETE FROM destination_metadatas WHERE terminal_guid = ?",
        ))
        .bind(terminal_guid)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            debug!(terminal_guid, "Destination has no metadata row, nothing to delete");
        }

        Ok(())
    }
}
