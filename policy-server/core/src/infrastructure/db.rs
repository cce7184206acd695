// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Connection Pool and SQL Dialects
//!
//! Wraps `sqlx::AnyPool` in a thin `Database` newtype that hands out
//! transactions to the stores. The same repositories run against Postgres,
//! MySQL and SQLite; the differences they care about are captured by
//! [`Dialect`]:
//!
//! - placeholder syntax (`$n` vs `?`), see [`rebind`]
//! - how an inserted row id is read back, see [`execute_insert`]
//! - native constraint violation codes, see `crate::infrastructure::db_errors`

use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::any::{AnyArguments, AnyPoolOptions};
use sqlx::query::Query;
use sqlx::{Any, AnyPool, Row};

use crate::domain::repository::{TransactionProvider, Tx};
use crate::domain::server_config::{DatabaseConfig, DatabaseType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    /// Maps a driver/backend name ("PostgreSQL", "mysql", ...) to a dialect.
    pub fn from_driver_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Dialect::Postgres),
            "mysql" | "mariadb" => Some(Dialect::MySql),
            "sqlite" => Some(Dialect::Sqlite),
            _ => None,
        }
    }

    /// Dialect of the connection behind `tx`.
    pub fn of(tx: &Tx) -> Result<Self, sqlx::Error> {
        let name = tx.backend_name();
        Self::from_driver_name(name).ok_or_else(|| {
            sqlx::Error::Configuration(format!("unsupported database driver: {}", name).into())
        })
    }
}

impl From<DatabaseType> for Dialect {
    fn from(database_type: DatabaseType) -> Self {
        match database_type {
            DatabaseType::Postgres => Dialect::Postgres,
            DatabaseType::Mysql => Dialect::MySql,
            DatabaseType::Sqlite => Dialect::Sqlite,
        }
    }
}

/// Rewrites `?` placeholders as `$1, $2, ...` for Postgres. Other dialects
/// take the query as written.
pub fn rebind(dialect: Dialect, sql: &str) -> Cow<'_, str> {
    if dialect != Dialect::Postgres || !sql.contains('?') {
        return Cow::Borrowed(sql);
    }

    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0;
    for c in sql.chars() {
        if c == '?' {
            n += 1;
            out.push('$');
            out.push_str(&n.to_string());
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// `?, ?, ?` for an `IN (...)` clause of `n` values.
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Builds an INSERT for `dialect`: rebinds placeholders and, on Postgres and
/// SQLite, asks for the new row id with `RETURNING id`.
///
/// The Any driver only reports `last_insert_id` for MySQL.
pub fn insert_sql(dialect: Dialect, sql: &str) -> String {
    match dialect {
        Dialect::Postgres | Dialect::Sqlite => format!("{} RETURNING id", rebind(dialect, sql)),
        Dialect::MySql => sql.to_string(),
    }
}

/// Runs an INSERT built with [`insert_sql`] and returns the new row id.
pub async fn execute_insert<'q>(
    tx: &mut Tx,
    dialect: Dialect,
    query: Query<'q, Any, AnyArguments<'q>>,
) -> Result<i64, sqlx::Error> {
    match dialect {
        Dialect::Postgres | Dialect::Sqlite => {
            let row = query.fetch_one(&mut **tx).await?;
            row.try_get::<i64, _>(0)
        }
        Dialect::MySql => {
            let result = query.execute(&mut **tx).await?;
            result
                .last_insert_id()
                .ok_or_else(|| sqlx::Error::Protocol("driver did not report a last insert id".to_string()))
        }
    }
}

#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
    dialect: Dialect,
}

impl Database {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        sqlx::any::install_default_drivers();

        let max_lifetime = match config.connections_max_lifetime_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let pool = AnyPoolOptions::new()
            .max_connections(config.max_open_connections)
            .min_connections(config.max_idle_connections.min(config.max_open_connections))
            .max_lifetime(max_lifetime)
            .connect(&config.connection_string)
            .await?;

        tracing::info!(
            database_type = ?config.database_type,
            max_open_connections = config.max_open_connections,
            "Database connection pool established"
        );

        Ok(Self {
            pool,
            dialect: config.database_type.into(),
        })
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }
}

#[async_trait]
impl TransactionProvider for Database {
    async fn begin(&self) -> Result<Tx, sqlx::Error> {
        self.pool.begin().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebind_postgres() {
        let sql = "UPDATE ip_ranges SET start_ip = ?, end_ip = ? WHERE terminal_guid = ?";
        assert_eq!(
            rebind(Dialect::Postgres, sql),
            "UPDATE ip_ranges SET start_ip = $1, end_ip = $2 WHERE terminal_guid = $3"
        );
    }

    #[test]
    fn test_rebind_leaves_other_dialects_alone() {
        let sql = "DELETE FROM terminals WHERE guid = ?";
        assert_eq!(rebind(Dialect::MySql, sql), sql);
        assert_eq!(rebind(Dialect::Sqlite, sql), sql);
    }

    #[test]
    fn test_insert_sql() {
        let sql = "INSERT INTO apps (terminal_guid, app_guid) VALUES (?, ?)";
        assert_eq!(
            insert_sql(Dialect::Postgres, sql),
            "INSERT INTO apps (terminal_guid, app_guid) VALUES ($1, $2) RETURNING id"
        );
        assert_eq!(
            insert_sql(Dialect::Sqlite, sql),
            "INSERT INTO apps (terminal_guid, app_guid) VALUES (?, ?) RETURNING id"
        );
        assert_eq!(insert_sql(Dialect::MySql, sql), sql);
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn test_dialect_from_driver_name() {
        assert_eq!(Dialect::from_driver_name("PostgreSQL"), Some(Dialect::Postgres));
        assert_eq!(Dialect::from_driver_name("MySQL"), Some(Dialect::MySql));
        assert_eq!(Dialect::from_driver_name("SQLite"), Some(Dialect::Sqlite));
        assert_eq!(Dialect::from_driver_name("oracle"), None);
    }
}
