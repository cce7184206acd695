// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Constraint violation classification
//!
//! Each engine reports the same two failures with its own native code:
//! Postgres by SQLSTATE, MySQL by server error number, SQLite by extended
//! result code. `CLASSIFICATION` maps `(dialect, code)` pairs to the kind of
//! violation; supporting another engine means adding rows here.

use sqlx::mysql::MySqlDatabaseError;

use crate::infrastructure::db::Dialect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintViolation {
    Unique,
    ForeignKey,
}

const CLASSIFICATION: &[(Dialect, &str, ConstraintViolation)] = &[
    (Dialect::Postgres, "23505", ConstraintViolation::Unique),
    (Dialect::Postgres, "23503", ConstraintViolation::ForeignKey),
    (Dialect::MySql, "1062", ConstraintViolation::Unique),
    (Dialect::MySql, "1451", ConstraintViolation::ForeignKey),
    (Dialect::MySql, "1452", ConstraintViolation::ForeignKey),
    (Dialect::Sqlite, "2067", ConstraintViolation::Unique),
    (Dialect::Sqlite, "1555", ConstraintViolation::Unique),
    (Dialect::Sqlite, "787", ConstraintViolation::ForeignKey),
];

/// The engine-specific code carried by a database error, if any.
///
/// On MySQL only a `MySqlDatabaseError` yields a code. That type can only be
/// built by the driver, so the successful downcast is exercised against a live
/// MySQL server, not in unit tests.
pub fn native_code(dialect: Dialect, err: &sqlx::Error) -> Option<String> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };

    match dialect {
        // MySQL's SQLSTATE is 23000 for both violations; the error number tells them apart
        Dialect::MySql => db_err
            .try_downcast_ref::<MySqlDatabaseError>()
            .map(|e| e.number().to_string()),
        Dialect::Postgres | Dialect::Sqlite => db_err.code().map(|code| code.into_owned()),
    }
}

pub fn lookup(dialect: Dialect, code: &str) -> Option<ConstraintViolation> {
    CLASSIFICATION
        .iter()
        .find(|(d, c, _)| *d == dialect && *c == code)
        .map(|(_, _, violation)| *violation)
}

pub fn classify(dialect: Dialect, err: &sqlx::Error) -> Option<ConstraintViolation> {
    native_code(dialect, err).and_then(|code| lookup(dialect, &code))
}

pub fn is_duplicate_error(dialect: Dialect, err: &sqlx::Error) -> bool {
    classify(dialect, err) == Some(ConstraintViolation::Unique)
}

pub fn is_foreign_key_error(dialect: Dialect, err: &sqlx::Error) -> bool {
    classify(dialect, err) == Some(ConstraintViolation::ForeignKey)
}
