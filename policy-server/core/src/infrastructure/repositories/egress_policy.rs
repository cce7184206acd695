// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Egress Policy Table
//!
//! `egress_policies` rows plus the `apps` / `spaces` rows that tie a platform
//! GUID to the terminal used as the policy source.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::any::AnyRow;
use sqlx::Row;

use crate::domain::egress_policy::{EgressSource, SourceType};
use crate::domain::repository::{EgressPolicyRecord, EgressPolicyRepository, GuidGenerator, Tx};
use crate::infrastructure::db::{execute_insert, insert_sql, placeholders, rebind, Dialect};
use crate::infrastructure::repositories::decode_error;

const SELECT_POLICIES: &str = r#"
    SELECT p.guid, p.source_guid, p.destination_guid, a.app_guid, s.space_guid
    FROM egress_policies p
    LEFT OUTER JOIN apps a ON a.terminal_guid = p.source_guid
    LEFT OUTER JOIN spaces s ON s.terminal_guid = p.source_guid
"#;

/// `(table, platform guid column)` holding sources of this type.
fn source_table(source_type: SourceType) -> (&'static str, &'static str) {
    match source_type {
        SourceType::App => ("apps", "app_guid"),
        SourceType::Space => ("spaces", "space_guid"),
    }
}

pub struct EgressPolicyTable {
    guids: Arc<dyn GuidGenerator>,
}

impl EgressPolicyTable {
    pub fn new(guids: Arc<dyn GuidGenerator>) -> Self {
        Self { guids }
    }
}

#[async_trait]
impl EgressPolicyRepository for EgressPolicyTable {
    async fn source_terminal(
        &self,
        tx: &mut Tx,
        source: &EgressSource,
    ) -> Result<Option<String>, sqlx::Error> {
        let dialect = Dialect::of(tx)?;
        let (table, column) = source_table(source.source_type);
        let sql = format!("SELECT terminal_guid FROM {} WHERE {} = ?", table, column);
        let sql = rebind(dialect, &sql);

        let terminal_guid = sqlx::query_scalar(&sql)
            .bind(&source.id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(terminal_guid)
    }

    async fn create_source(
        &self,
        tx: &mut Tx,
        terminal_guid: &str,
        source: &EgressSource,
    ) -> Result<i64, sqlx::Error> {
        let dialect = Dialect::of(tx)?;
        let (table, column) = source_table(source.source_type);
        let sql = insert_sql(
            dialect,
            &format!("INSERT INTO {} (terminal_guid, {}) VALUES (?, ?)", table, column),
        );

        let query = sqlx::query(&sql).bind(terminal_guid).bind(&source.id);
        execute_insert(tx, dialect, query).await
    }

    async fn delete_source(&self, tx: &mut Tx, source: &EgressSource) -> Result<(), sqlx::Error> {
        let dialect = Dialect::of(tx)?;
        let (table, column) = source_table(source.source_type);
        let sql = format!("DELETE FROM {} WHERE {} = ?", table, column);

        sqlx::query(&rebind(dialect, &sql))
            .bind(&source.id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn create_policy(
        &self,
        tx: &mut Tx,
        source_terminal_guid: &str,
        destination_terminal_guid: &str,
    ) -> Result<String, sqlx::Error> {
        let dialect = Dialect::of(tx)?;
        let guid = self.guids.new_guid();

        sqlx::query(&rebind(
            dialect,
            "INSERT INTO egress_policies (guid, source_guid, destination_guid) VALUES (?, ?, ?)",
        ))
        .bind(&guid)
        .bind(source_terminal_guid)
        .bind(destination_terminal_guid)
        .execute(&mut **tx)
        .await?;

        Ok(guid)
    }

    async fn all(&self, tx: &mut Tx) -> Result<Vec<EgressPolicyRecord>, sqlx::Error> {
        let sql = format!("{} ORDER BY p.id", SELECT_POLICIES);
        let rows = sqlx::query(&sql).fetch_all(&mut **tx).await?;

        rows.iter().map(parse_policy_row).collect()
    }

    async fn get_by_guid(
        &self,
        tx: &mut Tx,
        guids: &[String],
    ) -> Result<Vec<EgressPolicyRecord>, sqlx::Error> {
        if guids.is_empty() {
            return Ok(Vec::new());
        }

        let dialect = Dialect::of(tx)?;
        let sql = format!(
            "{} WHERE p.guid IN ({}) ORDER BY p.id",
            SELECT_POLICIES,
            placeholders(guids.len())
        );
        let sql = rebind(dialect, &sql);

        let mut query = sqlx::query(&sql);
        for guid in guids {
            query = query.bind(guid);
        }
        let rows = query.fetch_all(&mut **tx).await?;

        rows.iter().map(parse_policy_row).collect()
    }

    async fn delete_policy(&self, tx: &mut Tx, guid: &str) -> Result<(), sqlx::Error> {
        let dialect = Dialect::of(tx)?;
        sqlx::query(&rebind(dialect, "DELETE FROM egress_policies WHERE guid = ?"))
            .bind(guid)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn count_by_source(&self, tx: &mut Tx, terminal_guid: &str) -> Result<i64, sqlx::Error> {
        let dialect = Dialect::of(tx)?;
        let count: i64 = sqlx::query_scalar(&rebind(
            dialect,
            "SELECT COUNT(*) FROM egress_policies WHERE source_guid = ?",
        ))
        .bind(terminal_guid)
        .fetch_one(&mut **tx)
        .await?;
        Ok(count)
    }
}

fn parse_policy_row(row: &AnyRow) -> Result<EgressPolicyRecord, sqlx::Error> {
    let guid: String = row.try_get("guid")?;
    let source_guid: String = row.try_get("source_guid")?;
    let destination_guid: String = row.try_get("destination_guid")?;
    let app_guid: Option<String> = row.try_get("app_guid")?;
    let space_guid: Option<String> = row.try_get("space_guid")?;

    let (source_type, id) = match (app_guid, space_guid) {
        (Some(app), _) => (SourceType::App, app),
        (None, Some(space)) => (SourceType::Space, space),
        (None, None) => {
            return Err(decode_error(format!(
                "egress policy {}: source terminal {} is neither an app nor a space",
                guid, source_guid
            )))
        }
    };

    Ok(EgressPolicyRecord {
        guid,
        source: EgressSource {
            source_type,
            id,
            terminal_guid: source_guid,
        },
        destination_guid,
    })
}
