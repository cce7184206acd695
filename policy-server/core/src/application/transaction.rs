// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Transaction helpers shared by the stores
//!
//! Every public store method opens exactly one transaction and ends it before
//! returning: commit on success, rollback on any failure and after every read.

use std::future::Future;
use std::time::Instant;

use tracing::warn;

use crate::domain::repository::{StoreError, TransactionProvider, Tx};
use crate::infrastructure::db::Dialect;

pub(crate) async fn begin(
    conn: &dyn TransactionProvider,
    operation: &'static str,
) -> Result<(Tx, Dialect), StoreError> {
    let tx = conn
        .begin()
        .await
        .map_err(|source| StoreError::Transaction { operation, source })?;

    match Dialect::of(&tx) {
        Ok(dialect) => Ok((tx, dialect)),
        Err(source) => {
            rollback(tx, operation).await;
            Err(StoreError::Transaction { operation, source })
        }
    }
}

pub(crate) async fn commit(tx: Tx, operation: &'static str) -> Result<(), StoreError> {
    tx.commit()
        .await
        .map_err(|source| StoreError::Transaction { operation, source })
}

/// Rolls back `tx`. A failed rollback is logged, never returned.
pub(crate) async fn rollback(tx: Tx, operation: &'static str) {
    if let Err(e) = tx.rollback().await {
        warn!(operation, error = %e, "Transaction rollback failed");
    }
}

/// Commits when `result` is a success, rolls back otherwise.
pub(crate) async fn finish<T>(
    tx: Tx,
    result: Result<T, StoreError>,
    commit_operation: &'static str,
) -> Result<T, StoreError> {
    match result {
        Ok(value) => {
            commit(tx, commit_operation).await?;
            Ok(value)
        }
        Err(e) => {
            rollback(tx, commit_operation).await;
            Err(e)
        }
    }
}

/// Runs one store operation and records its latency, failures included.
pub(crate) async fn timed<T, F>(store: &'static str, operation: &'static str, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    let started = Instant::now();
    let result = fut.await;
    metrics::histogram!(
        "policy_store_operation_duration_seconds",
        "store" => store,
        "operation" => operation,
        "outcome" => if result.is_ok() { "ok" } else { "error" }
    )
    .record(started.elapsed().as_secs_f64());
    result
}
