// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

#![allow(dead_code)]

use std::sync::Arc;

use policy_server_core::application::{EgressDestinationStore, EgressPolicyStore};
use policy_server_core::domain::destination::{EgressDestination, IpRange, Protocol};
use policy_server_core::domain::server_config::{DatabaseConfig, DatabaseType};
use policy_server_core::infrastructure::guid::UuidGenerator;
use policy_server_core::infrastructure::repositories::{
    DestinationMetadataTable, EgressDestinationTable, EgressPolicyTable, TerminalsTable,
};
use policy_server_core::infrastructure::{schema, Database};
use tempfile::TempDir;

/// Migrated SQLite database in a temporary directory. The directory lives as
/// long as this value.
pub struct TestDb {
    pub db: Database,
    _dir: TempDir,
}

pub async fn sqlite_db() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.db");
    let config = DatabaseConfig {
        database_type: DatabaseType::Sqlite,
        connection_string: format!("sqlite://{}?mode=rwc", path.display()),
        max_open_connections: 1,
        max_idle_connections: 1,
        connections_max_lifetime_seconds: 0,
    };

    let db = Database::new(&config).await.unwrap();
    schema::migrate(&db).await.unwrap();
    TestDb { db, _dir: dir }
}

pub fn destination_store(db: &Database) -> EgressDestinationStore {
    EgressDestinationStore::new(
        Arc::new(db.clone()),
        Arc::new(EgressDestinationTable::new()),
        Arc::new(TerminalsTable::new(Arc::new(UuidGenerator))),
        Arc::new(DestinationMetadataTable::new()),
    )
}

pub fn policy_store(db: &Database) -> EgressPolicyStore {
    EgressPolicyStore::new(
        Arc::new(db.clone()),
        Arc::new(EgressPolicyTable::new(Arc::new(UuidGenerator))),
        Arc::new(EgressDestinationTable::new()),
        Arc::new(TerminalsTable::new(Arc::new(UuidGenerator))),
    )
}

pub fn tcp_destination(name: &str) -> EgressDestination {
    EgressDestination::new(name, Protocol::Tcp, IpRange::new("10.0.0.1", "10.0.0.10"))
        .with_description(format!("{} description", name))
        .with_ports(8080, 8090)
}

pub async fn count(db: &Database, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(db.pool())
        .await
        .unwrap()
}
