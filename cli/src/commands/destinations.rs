// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Egress destination commands
//!
//! Commands: list, create, update, delete
//!
//! Input files and output use the destinations envelope,
//! `{"total_destinations": N, "destinations": [...]}`.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::services::Services;

#[derive(Subcommand)]
pub enum DestinationsCommand {
    /// List all egress destinations, most recent first
    List,

    /// Create egress destinations from a destinations envelope
    Create {
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,
    },

    /// Update existing egress destinations (matched by id)
    Update {
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,
    },

    /// Delete one egress destination
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

pub async fn handle_command(command: DestinationsCommand, services: &Services) -> Result<()> {
    let output = execute(command, services).await?;
    println!("{}", output);
    Ok(())
}

/// Runs `command` and returns the envelope to print.
pub async fn execute(command: DestinationsCommand, services: &Services) -> Result<String> {
    let mapper = &services.destination_mapper;

    let destinations = match command {
        DestinationsCommand::List => services
            .destinations
            .all()
            .await
            .context("Failed to list destinations")?,
        DestinationsCommand::Create { file } => {
            let destinations = mapper
                .as_egress_destinations(&read_payload(&file)?)
                .context("Invalid destinations payload")?;
            let created = services
                .destinations
                .create(destinations)
                .await
                .context("Failed to create destinations")?;
            eprintln!("{}", format!("✓ Created {} destination(s)", created.len()).green());
            created
        }
        DestinationsCommand::Update { file } => {
            let destinations = mapper
                .as_egress_destinations(&read_payload(&file)?)
                .context("Invalid destinations payload")?;
            let updated = services
                .destinations
                .update(destinations)
                .await
                .context("Failed to update destinations")?;
            eprintln!("{}", format!("✓ Updated {} destination(s)", updated.len()).green());
            updated
        }
        DestinationsCommand::Delete { id } => {
            let deleted = services
                .destinations
                .delete(&id)
                .await
                .with_context(|| format!("Failed to delete destination {}", id))?;
            if deleted.is_empty() {
                eprintln!("{}", format!("No destination with id {}", id).yellow());
                Vec::new()
            } else {
                eprintln!("{}", format!("✓ Deleted destination {}", deleted.name).green());
                vec![deleted]
            }
        }
    };

    let bytes = mapper.as_bytes(&destinations)?;
    let value: serde_json::Value = serde_json::from_slice(&bytes)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

fn read_payload(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy_server_core::domain::server_config::{DatabaseConfig, DatabaseType};
    use policy_server_core::infrastructure::{schema, Database};
    use serde_json::{json, Value};

    async fn services(dir: &Path) -> Services {
        let config = DatabaseConfig {
            database_type: DatabaseType::Sqlite,
            connection_string: format!("sqlite://{}?mode=rwc", dir.join("cli.db").display()),
            max_open_connections: 1,
            max_idle_connections: 1,
            connections_max_lifetime_seconds: 0,
        };
        let db = Database::new(&config).await.unwrap();
        schema::migrate(&db).await.unwrap();
        Services::new(db)
    }

    fn write_payload(dir: &Path, payload: Value) -> PathBuf {
        let path = dir.join("destinations.json");
        std::fs::write(&path, payload.to_string()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_create_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let services = services(dir.path()).await;
        let file = write_payload(
            dir.path(),
            json!({
                "destinations": [{
                    "name": "mynet",
                    "description": "internal network",
                    "protocol": "tcp",
                    "ips": [{"start": "10.0.0.1", "end": "10.0.0.255"}],
                    "ports": [{"start": 443, "end": 443}]
                }]
            }),
        );

        let created: Value =
            serde_json::from_str(&execute(DestinationsCommand::Create { file }, &services).await.unwrap()).unwrap();
        assert_eq!(created["total_destinations"], json!(1));
        let id = created["destinations"][0]["id"].as_str().unwrap().to_string();

        let listed: Value =
            serde_json::from_str(&execute(DestinationsCommand::List, &services).await.unwrap()).unwrap();
        assert_eq!(listed, created);

        let deleted: Value = serde_json::from_str(
            &execute(DestinationsCommand::Delete { id: id.clone() }, &services)
                .await
                .unwrap(),
        )
        .unwrap();
        assert_eq!(deleted["destinations"][0]["id"], json!(id));

        let again: Value =
            serde_json::from_str(&execute(DestinationsCommand::Delete { id }, &services).await.unwrap()).unwrap();
        assert_eq!(again, json!({"total_destinations": 0, "destinations": []}));
    }

    #[tokio::test]
    async fn test_invalid_payload_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let services = services(dir.path()).await;
        let file = write_payload(
            dir.path(),
            json!({"destinations": [{"name": "", "protocol": "tcp", "ips": []}]}),
        );

        let err = execute(DestinationsCommand::Create { file }, &services).await.unwrap_err();

        assert!(format!("{:#}", err).contains("validate destinations"));
        assert!(services.destinations.all().await.unwrap().is_empty());
    }
}
