// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Terminals Table
//!
//! Identity anchors. A terminal GUID is the public identifier of whatever owns
//! it (an app or space source, or an egress destination) and the foreign key
//! target of every relationship table.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::repository::{GuidGenerator, TerminalsRepository, Tx};
use crate::infrastructure::db::{rebind, Dialect};

pub struct TerminalsTable {
    guids: Arc<dyn GuidGenerator>,
}

impl TerminalsTable {
    pub fn new(guids: Arc<dyn GuidGenerator>) -> Self {
        Self { guids }
    }
}

#[async_trait]
impl TerminalsRepository for TerminalsTable {
    async fn create(&self, tx: &mut Tx) -> Result<String, sqlx::Error> {
        let dialect = Dialect::of(tx)?;
        let guid = self.guids.new_guid();

        sqlx::query(&rebind(dialect, "INSERT INTO terminals (guid) VALUES (?)"))
            .bind(&guid)
            .execute(&mut **tx)
            .await?;

        Ok(guid)
    }

    async fn delete(&self, tx: &mut Tx, guid: &str) -> Result<(), sqlx::Error> {
        let dialect = Dialect::of(tx)?;

        sqlx::query(&rebind(dialect, "DELETE FROM terminals WHERE guid = ?"))
            .bind(guid)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}
