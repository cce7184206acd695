// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the policy server CLI

pub mod config;
pub mod destinations;
pub mod migrate;

pub use self::config::ConfigCommand;
pub use self::destinations::DestinationsCommand;
