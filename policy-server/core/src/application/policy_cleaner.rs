// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Policy Cleaner - Background reconciliation of egress policies
//!
//! Periodically reads every egress policy, asks the platform which of the
//! referenced apps and spaces still exist, and deletes the policies whose
//! source is gone. Each cycle is one `all` read followed by one `delete`
//! transaction.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::EgressPolicyStore;
use crate::domain::egress_policy::{EgressPolicy, SourceType};
use crate::domain::repository::StoreError;
use crate::domain::server_config::CleanupConfig;

/// Live membership lookups against the platform's API.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// The subset of `guids` naming apps that still exist.
    async fn live_app_guids(&self, guids: &[String]) -> Result<HashSet<String>>;

    /// The subset of `guids` naming spaces that still exist.
    async fn live_space_guids(&self, guids: &[String]) -> Result<HashSet<String>>;
}

/// What the cleaner needs from the policy store.
#[async_trait]
pub trait PolicyCleanupStore: Send + Sync {
    async fn all(&self) -> Result<Vec<EgressPolicy>, StoreError>;

    async fn delete(&self, guids: &[String]) -> Result<Vec<EgressPolicy>, StoreError>;
}

#[async_trait]
impl PolicyCleanupStore for EgressPolicyStore {
    async fn all(&self) -> Result<Vec<EgressPolicy>, StoreError> {
        EgressPolicyStore::all(self).await
    }

    async fn delete(&self, guids: &[String]) -> Result<Vec<EgressPolicy>, StoreError> {
        EgressPolicyStore::delete(self, guids).await
    }
}

pub struct PolicyCleaner {
    store: Arc<dyn PolicyCleanupStore>,
    platform: Arc<dyn PlatformClient>,
    config: CleanupConfig,
    shutdown_token: CancellationToken,
}

impl PolicyCleaner {
    pub fn new(
        store: Arc<dyn PolicyCleanupStore>,
        platform: Arc<dyn PlatformClient>,
        config: CleanupConfig,
    ) -> Self {
        Self {
            store,
            platform,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Get a handle to trigger shutdown
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        if !self.config.enabled {
            info!("Policy cleaner is disabled");
            return;
        }

        info!(
            interval_seconds = self.config.interval_seconds,
            chunk_size = self.config.chunk_size,
            "Starting policy cleaner background task"
        );

        let mut tick = interval(Duration::from_secs(self.config.interval_seconds.max(1)));

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    debug!("Running policy cleaner cycle");

                    match self.delete_stale_policies().await {
                        Ok(deleted) => {
                            info!(deleted = deleted.len(), "Policy cleaner cycle completed");
                        }
                        Err(e) => {
                            warn!("Policy cleaner cycle failed: {:#}", e);
                        }
                    }
                }
                _ = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received, stopping policy cleaner");
                    break;
                }
            }
        }

        info!("Policy cleaner background task stopped");
    }

    /// Runs one reconciliation pass and returns the policies it deleted.
    pub async fn delete_stale_policies(&self) -> Result<Vec<EgressPolicy>> {
        let policies = self.store.all().await.context("list egress policies")?;

        let app_guids = source_ids(&policies, SourceType::App);
        let space_guids = source_ids(&policies, SourceType::Space);

        let live_apps = self.lookup(&app_guids, SourceType::App).await?;
        let live_spaces = self.lookup(&space_guids, SourceType::Space).await?;

        let stale: Vec<String> = policies
            .iter()
            .filter(|p| {
                let live = match p.source.source_type {
                    SourceType::App => &live_apps,
                    SourceType::Space => &live_spaces,
                };
                !live.contains(&p.source.id)
            })
            .map(|p| p.guid.clone())
            .collect();

        if stale.is_empty() {
            return Ok(Vec::new());
        }

        let deleted = self
            .store
            .delete(&stale)
            .await
            .context("delete stale egress policies")?;

        metrics::counter!("policy_cleaner_stale_policies_deleted_total").increment(deleted.len() as u64);
        info!(count = deleted.len(), "Deleted stale egress policies");
        Ok(deleted)
    }

    async fn lookup(&self, guids: &[String], source_type: SourceType) -> Result<HashSet<String>> {
        let mut live = HashSet::with_capacity(guids.len());
        for chunk in guids.chunks(self.config.chunk_size.max(1)) {
            let found = match source_type {
                SourceType::App => self.platform.live_app_guids(chunk).await,
                SourceType::Space => self.platform.live_space_guids(chunk).await,
            }
            .with_context(|| format!("look up live {} guids", source_type))?;
            live.extend(found);
        }
        Ok(live)
    }
}

/// Distinct source ids of the given type, in first-seen order.
fn source_ids(policies: &[EgressPolicy], source_type: SourceType) -> Vec<String> {
    let mut seen = HashSet::new();
    policies
        .iter()
        .filter(|p| p.source.source_type == source_type)
        .filter(|p| seen.insert(p.source.id.clone()))
        .map(|p| p.source.id.clone())
        .collect()
}
