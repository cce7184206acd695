// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain Layer
//!
//! Store-side entities and the repository contracts the SQL layer implements.

pub mod destination;
pub mod egress_policy;
pub mod repository;
pub mod server_config;
