// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Schema Migration Command
//!
//! `policy-server migrate` creates any missing policy tables for the
//! configured engine. Safe to run repeatedly.

use anyhow::{Context, Result};
use colored::Colorize;

use policy_server_core::infrastructure::schema;

use crate::services::Services;

pub async fn execute(services: &Services) -> Result<()> {
    println!("{}", "Policy Server Migrate".bold().green());
    println!("Dialect: {:?}", services.db.dialect());

    schema::migrate(&services.db)
        .await
        .context("Failed to apply schema")?;

    println!("{}", "✓ Database schema is up to date.".green());
    Ok(())
}
