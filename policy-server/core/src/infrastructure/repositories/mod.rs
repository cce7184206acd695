// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! SQL implementations of the repository contracts in
//! `crate::domain::repository`. Queries are written with `?` placeholders and
//! passed through `rebind` so the same text runs on every supported engine.
//!
//! # Available Implementations
//!
//! - **TerminalsTable** - identity anchor rows
//! - **DestinationMetadataTable** - destination name and description
//! - **EgressDestinationTable** - IP range / protocol rows and destination reads
//! - **EgressPolicyTable** - egress policies and their app/space sources
//!
//! # Usage
//!
//! ```no_run
//! # async fn example(db: policy_server_core::infrastructure::Database) -> Result<(), sqlx::Error> {
//! use std::sync::Arc;
//! use policy_server_core::domain::repository::{TerminalsRepository, TransactionProvider};
//! use policy_server_core::infrastructure::guid::UuidGenerator;
//! use policy_server_core::infrastructure::repositories::TerminalsTable;
//!
//! let terminals = TerminalsTable::new(Arc::new(UuidGenerator));
//! let mut tx = db.begin().await?;
//! let guid = terminals.create(&mut tx).await?;
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```

pub mod destination_metadata;
pub mod egress_destination;
pub mod egress_policy;
pub mod terminals;

pub use destination_metadata::DestinationMetadataTable;
pub use egress_destination::EgressDestinationTable;
pub use egress_policy::EgressPolicyTable;
pub use terminals::TerminalsTable;

use crate::domain::repository::Tx;
use crate::infrastructure::db::{rebind, Dialect};

/// Whether any row in `table` has `column = value`.
pub(crate) async fn row_exists(
    tx: &mut Tx,
    dialect: Dialect,
    table: &str,
    column: &str,
    value: &str,
) -> Result<bool, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = ?", table, column);
    let count: i64 = sqlx::query_scalar(&rebind(dialect, &sql))
        .bind(value)
        .fetch_one(&mut **tx)
        .await?;
    Ok(count > 0)
}

pub(crate) fn decode_error(message: String) -> sqlx::Error {
    sqlx::Error::Decode(message.into())
}
