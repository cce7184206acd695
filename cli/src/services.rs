// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Wiring of the database, repositories and stores used by the commands.

use std::sync::Arc;

use anyhow::{Context, Result};

use policy_server_core::application::EgressDestinationStore;
use policy_server_core::domain::server_config::PolicyServerConfig;
use policy_server_core::infrastructure::guid::UuidGenerator;
use policy_server_core::infrastructure::repositories::{
    DestinationMetadataTable, EgressDestinationTable, TerminalsTable,
};
use policy_server_core::infrastructure::Database;
use policy_server_core::presentation::{EgressDestinationMapper, PayloadValidator};

pub struct Services {
    pub db: Database,
    pub destinations: EgressDestinationStore,
    pub destination_mapper: EgressDestinationMapper,
}

impl Services {
    pub async fn connect(config: &PolicyServerConfig) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        let db = Database::new(&config.database)
            .await
            .context("Failed to connect to database")?;

        Ok(Self::new(db))
    }

    pub fn new(db: Database) -> Self {
        let destinations = EgressDestinationStore::new(
            Arc::new(db.clone()),
            Arc::new(EgressDestinationTable::new()),
            Arc::new(TerminalsTable::new(Arc::new(UuidGenerator))),
            Arc::new(DestinationMetadataTable::new()),
        );

        Self {
            db,
            destinations,
            destination_mapper: EgressDestinationMapper::new(Arc::new(PayloadValidator)),
        }
    }
}
