// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod db;
pub mod db_errors;
pub mod guid;
pub mod repositories;
pub mod schema;

pub use db::{Database, Dialect};
