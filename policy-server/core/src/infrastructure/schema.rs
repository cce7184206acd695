// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Schema
//!
//! Idempotent DDL for the policy tables. Every policy-relevant entity owns a
//! row in `terminals`; the other tables reference `terminals.guid` without
//! cascading, so deleting a referenced terminal is a foreign key violation.

use crate::infrastructure::db::{Database, Dialect};

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS terminals (
        {id},
        guid VARCHAR(36) NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS destination_metadatas (
        {id},
        terminal_guid VARCHAR(36) NOT NULL UNIQUE,
        name VARCHAR(255) NOT NULL UNIQUE,
        description TEXT,
        FOREIGN KEY (terminal_guid) REFERENCES terminals (guid)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ip_ranges (
        {id},
        protocol VARCHAR(8) NOT NULL,
        start_ip VARCHAR(15) NOT NULL,
        end_ip VARCHAR(15) NOT NULL,
        start_port BIGINT,
        end_port BIGINT,
        icmp_type BIGINT,
        icmp_code BIGINT,
        terminal_guid VARCHAR(36) NOT NULL,
        FOREIGN KEY (terminal_guid) REFERENCES terminals (guid)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS apps (
        {id},
        terminal_guid VARCHAR(36) NOT NULL UNIQUE,
        app_guid VARCHAR(36) NOT NULL UNIQUE,
        FOREIGN KEY (terminal_guid) REFERENCES terminals (guid)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS spaces (
        {id},
        terminal_guid VARCHAR(36) NOT NULL UNIQUE,
        space_guid VARCHAR(36) NOT NULL UNIQUE,
        FOREIGN KEY (terminal_guid) REFERENCES terminals (guid)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS egress_policies (
        {id},
        guid VARCHAR(36) NOT NULL UNIQUE,
        source_guid VARCHAR(36) NOT NULL,
        destination_guid VARCHAR(36) NOT NULL,
        FOREIGN KEY (source_guid) REFERENCES terminals (guid),
        FOREIGN KEY (destination_guid) REFERENCES terminals (guid)
    )
    "#,
];

fn id_column(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Postgres => "id BIGSERIAL PRIMARY KEY",
        Dialect::MySql => "id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY",
        Dialect::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT",
    }
}

/// DDL statements for `dialect`, in dependency order.
pub fn statements(dialect: Dialect) -> Vec<String> {
    TABLES
        .iter()
        .map(|table| table.replace("{id}", id_column(dialect)))
        .collect()
}

/// Creates any missing tables.
pub async fn migrate(db: &Database) -> Result<(), sqlx::Error> {
    let statements = statements(db.dialect());
    for statement in &statements {
        sqlx::query(statement).execute(db.pool()).await?;
    }
    tracing::info!(tables = statements.len(), dialect = ?db.dialect(), "Schema is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_use_dialect_id_column() {
        let mysql = statements(Dialect::MySql);
        assert_eq!(mysql.len(), 6);
        assert!(mysql[0].contains("AUTO_INCREMENT"));
        assert!(statements(Dialect::Postgres)[0].contains("BIGSERIAL"));
        assert!(!statements(Dialect::Sqlite)
            .iter()
            .any(|s| s.contains("{id}")));
    }

    #[test]
    fn test_no_cascading_deletes() {
        for statement in statements(Dialect::Postgres) {
            assert!(!statement.to_uppercase().contains("CASCADE"));
        }
    }
}
