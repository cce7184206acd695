// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Policy Server Core
//!
//! Persistence and consistency core of the network policy server: egress
//! destinations, egress policies and the terminal rows that anchor them.
//!
//! # Architecture
//!
//! - **domain:** entities, repository contracts, errors, configuration
//! - **infrastructure:** SQL dialects, error classification, repositories
//! - **application:** transactional stores and the stale policy cleaner
//! - **presentation:** wire schema, mappers and payload validation

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
