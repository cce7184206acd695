// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use common::{count, destination_store, policy_store, sqlite_db, tcp_destination};
use policy_server_core::application::{PlatformClient, PolicyCleaner};
use policy_server_core::domain::egress_policy::{EgressPolicy, EgressSource, SourceType};
use policy_server_core::domain::server_config::CleanupConfig;

#[tokio::test]
async fn test_create_populates_guid_and_destination() {
    let test_db = sqlite_db().await;
    let destination = destination_store(&test_db.db)
        .create(vec![tcp_destination("mynet")])
        .await
        .unwrap()
        .remove(0);
    let store = policy_store(&test_db.db);

    let created = store
        .create(vec![EgressPolicy::new(EgressSource::app("app-1"), destination.guid.clone())])
        .await
        .unwrap();

    assert_eq!(created.len(), 1);
    assert!(!created[0].guid.is_empty());
    assert!(!created[0].source.terminal_guid.is_empty());
    assert_eq!(created[0].destination, destination);

    let all = store.all().await.unwrap();
    assert_eq!(all, created);
}

#[tokio::test]
async fn test_policies_share_source_terminal() {
    let test_db = sqlite_db().await;
    let destinations = destination_store(&test_db.db)
        .create(vec![tcp_destination("a"), tcp_destination("b")])
        .await
        .unwrap();
    let store = policy_store(&test_db.db);

    let created = store
        .create(vec![
            EgressPolicy::new(EgressSource::app("app-1"), destinations[0].guid.clone()),
            EgressPolicy::new(EgressSource::app("app-1"), destinations[1].guid.clone()),
            EgressPolicy::new(EgressSource::space("space-1"), destinations[1].guid.clone()),
        ])
        .await
        .unwrap();

    assert_eq!(created[0].source.terminal_guid, created[1].source.terminal_guid);
    assert_ne!(created[0].source.terminal_guid, created[2].source.terminal_guid);
    assert_eq!(count(&test_db.db, "apps").await, 1);
    assert_eq!(count(&test_db.db, "spaces").await, 1);

    let all = store.all().await.unwrap();
    let guids: Vec<&str> = all.iter().map(|p| p.guid.as_str()).collect();
    let expected: Vec<&str> = created.iter().map(|p| p.guid.as_str()).collect();
    assert_eq!(guids, expected);
    assert_eq!(all[2].source.source_type, SourceType::Space);
}

#[tokio::test]
async fn test_create_with_unknown_destination_is_foreign_key_error() {
    let test_db = sqlite_db().await;
    let store = policy_store(&test_db.db);

    let err = store
        .create(vec![EgressPolicy::new(EgressSource::app("app-1"), "missing-destination")])
        .await
        .unwrap_err();

    assert!(err.is_foreign_key());
    assert_eq!(count(&test_db.db, "terminals").await, 0);
    assert_eq!(count(&test_db.db, "apps").await, 0);
}

#[tokio::test]
async fn test_delete_removes_orphaned_sources() {
    let test_db = sqlite_db().await;
    let destinations = destination_store(&test_db.db)
        .create(vec![tcp_destination("a"), tcp_destination("b")])
        .await
        .unwrap();
    let store = policy_store(&test_db.db);
    let created = store
        .create(vec![
            EgressPolicy::new(EgressSource::app("app-1"), destinations[0].guid.clone()),
            EgressPolicy::new(EgressSource::app("app-1"), destinations[1].guid.clone()),
        ])
        .await
        .unwrap();

    let deleted = store.delete(&[created[0].guid.clone()]).await.unwrap();
    assert_eq!(deleted, vec![created[0].clone()]);
    assert_eq!(count(&test_db.db, "apps").await, 1);

    store.delete(&[created[1].guid.clone()]).await.unwrap();
    assert_eq!(count(&test_db.db, "apps").await, 0);
    assert_eq!(count(&test_db.db, "egress_policies").await, 0);
    // only the two destination terminals remain
    assert_eq!(count(&test_db.db, "terminals").await, 2);
}

#[tokio::test]
async fn test_delete_unknown_guid_is_skipped() {
    let test_db = sqlite_db().await;
    let store = policy_store(&test_db.db);

    let deleted = store.delete(&["no-such-policy".to_string()]).await.unwrap();

    assert!(deleted.is_empty());
}

#[tokio::test]
async fn test_destination_deletable_after_policy_removed() {
    let test_db = sqlite_db().await;
    let destinations = destination_store(&test_db.db);
    let destination = destinations.create(vec![tcp_destination("a")]).await.unwrap().remove(0);
    let store = policy_store(&test_db.db);
    let policy = store
        .create(vec![EgressPolicy::new(EgressSource::space("space-1"), destination.guid.clone())])
        .await
        .unwrap()
        .remove(0);

    assert!(destinations.delete(&destination.guid).await.unwrap_err().is_foreign_key());

    store.delete(&[policy.guid]).await.unwrap();
    let deleted = destinations.delete(&destination.guid).await.unwrap();
    assert_eq!(deleted.guid, destination.guid);
}

struct Platform {
    apps: HashSet<String>,
}

#[async_trait]
impl PlatformClient for Platform {
    async fn live_app_guids(&self, guids: &[String]) -> anyhow::Result<HashSet<String>> {
        Ok(guids.iter().filter(|g| self.apps.contains(*g)).cloned().collect())
    }

    async fn live_space_guids(&self, _guids: &[String]) -> anyhow::Result<HashSet<String>> {
        Ok(HashSet::new())
    }
}

#[tokio::test]
async fn test_cleaner_deletes_stale_policies_from_store() {
    let test_db = sqlite_db().await;
    let destination = destination_store(&test_db.db)
        .create(vec![tcp_destination("a")])
        .await
        .unwrap()
        .remove(0);
    let store = Arc::new(policy_store(&test_db.db));
    store
        .create(vec![
            EgressPolicy::new(EgressSource::app("live-app"), destination.guid.clone()),
            EgressPolicy::new(EgressSource::app("deleted-app"), destination.guid.clone()),
            EgressPolicy::new(EgressSource::space("deleted-space"), destination.guid.clone()),
        ])
        .await
        .unwrap();

    let platform = Arc::new(Platform {
        apps: ["live-app".to_string()].into_iter().collect(),
    });
    let cleaner = PolicyCleaner::new(store.clone(), platform, CleanupConfig::default());

    let deleted = cleaner.delete_stale_policies().await.unwrap();

    assert_eq!(deleted.len(), 2);
    let remaining = store.all().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].source.id, "live-app");
    assert_eq!(count(&test_db.db, "apps").await, 1);
    assert_eq!(count(&test_db.db, "spaces").await, 0);
}
