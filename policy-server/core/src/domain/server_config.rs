// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Policy Server Configuration
//
// YAML configuration for the policy server process:
// - Database engine, connection string and pool sizing
// - Stale policy cleanup schedule
// - Default log level

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "POLICY_SERVER_CONFIG_PATH";
pub const DATABASE_URL_ENV: &str = "POLICY_SERVER_DATABASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyServerConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub cleanup: CleanupConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    Postgres,
    Mysql,
    Sqlite,
}

impl DatabaseType {
    /// URL schemes accepted for this engine.
    fn schemes(&self) -> &'static [&'static str] {
        match self {
            DatabaseType::Postgres => &["postgres", "postgresql"],
            DatabaseType::Mysql => &["mysql", "mariadb"],
            DatabaseType::Sqlite => &["sqlite"],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(rename = "type")]
    pub database_type: DatabaseType,

    #[serde(default)]
    pub connection_string: String,

    #[serde(default = "default_max_open_connections")]
    pub max_open_connections: u32,

    #[serde(default = "default_max_idle_connections")]
    pub max_idle_connections: u32,

    /// 0 keeps connections open indefinitely
    #[serde(default)]
    pub connections_max_lifetime_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_type: DatabaseType::Postgres,
            connection_string: String::new(),
            max_open_connections: default_max_open_connections(),
            max_idle_connections: default_max_idle_connections(),
            connections_max_lifetime_seconds: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_cleanup_interval")]
    pub interval_seconds: u64,

    /// Number of source GUIDs looked up on the platform per request
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: default_cleanup_interval(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl Default for PolicyServerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            database: DatabaseConfig::default(),
            cleanup: CleanupConfig::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_open_connections() -> u32 {
    10
}

fn default_max_idle_connections() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

fn default_cleanup_interval() -> u64 {
    60
}

fn default_chunk_size() -> usize {
    100
}

impl PolicyServerConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. POLICY_SERVER_CONFIG_PATH environment variable
    /// 2. ./policy-server.yaml (working directory)
    /// 3. /etc/policy-server/config.yaml
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./policy-server.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        let system_config = PathBuf::from("/etc/policy-server/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // An explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            Self::from_yaml_file(config_path)?
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            if !url.is_empty() {
                tracing::info!("Environment override: {} is set", DATABASE_URL_ENV);
                self.database.connection_string = url;
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        let db = &self.database;
        if db.connection_string.is_empty() {
            anyhow::bail!("database.connection_string cannot be empty");
        }

        let scheme = db
            .connection_string
            .split_once(':')
            .map(|(scheme, _)| scheme)
            .unwrap_or_default();
        if !db.database_type.schemes().contains(&scheme) {
            anyhow::bail!(
                "database.connection_string scheme '{}' does not match database.type {:?}",
                scheme,
                db.database_type
            );
        }

        if db.max_open_connections == 0 {
            anyhow::bail!("database.max_open_connections must be greater than 0");
        }

        if db.max_idle_connections > db.max_open_connections {
            anyhow::bail!(
                "database.max_idle_connections ({}) cannot exceed max_open_connections ({})",
                db.max_idle_connections,
                db.max_open_connections
            );
        }

        if self.cleanup.chunk_size == 0 {
            anyhow::bail!("cleanup.chunk_size must be greater than 0");
        }

        if self.cleanup.enabled && self.cleanup.interval_seconds == 0 {
            anyhow::bail!("cleanup.interval_seconds must be greater than 0 when cleanup is enabled");
        }

        Ok(())
    }
}
