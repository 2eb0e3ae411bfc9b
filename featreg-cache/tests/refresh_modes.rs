//! Refresh behaviour of each cache mode, driven on a paused tokio clock.

use std::sync::Arc;
use std::time::Duration;

use featreg_cache::CachingRegistry;
use featreg_core::{Entity, RefreshMode};
use featreg_test_utils::assertions::{assert_not_found, assert_store_error};
use featreg_test_utils::fixtures::{
    background_config, manual_config, on_demand_config, sample_store,
};
use featreg_test_utils::{InMemoryRegistryStore, InstrumentedStore};

type Store = InstrumentedStore<InMemoryRegistryStore>;

async fn start(
    store: &Arc<Store>,
    config: featreg_core::CacheConfig,
) -> (CachingRegistry<Store>, featreg_cache::RefreshHandle) {
    CachingRegistry::new(Arc::clone(store), config)
        .await
        .expect("initial load")
}

const EPSILON: Duration = Duration::from_millis(1);

#[tokio::test(start_paused = true)]
async fn on_demand_refreshes_only_after_ttl_has_passed() {
    let store = Arc::new(sample_store("fraud"));
    let (registry, _handle) = start(&store, on_demand_config("fraud", 5)).await;
    assert_eq!(store.fetch_count(), 1);

    tokio::time::sleep(Duration::from_secs(5)).await;
    registry.get_entity("driver", "fraud", true).await.unwrap();
    assert_eq!(store.fetch_count(), 1, "exactly at the TTL the snapshot is fresh");

    tokio::time::sleep(EPSILON).await;
    registry.get_entity("driver", "fraud", true).await.unwrap();
    assert_eq!(store.fetch_count(), 2, "past the TTL a read refreshes first");

    registry.list_feature_views("fraud", true, None).await.unwrap();
    assert_eq!(store.fetch_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn zero_ttl_never_expires() {
    let store = Arc::new(sample_store("fraud"));
    let (registry, _handle) = start(&store, on_demand_config("fraud", 0)).await;

    tokio::time::sleep(Duration::from_secs(86_400 * 365)).await;
    registry.get_entity("driver", "fraud", true).await.unwrap();
    assert_eq!(store.fetch_count(), 1);

    registry.refresh(None).await.unwrap();
    assert_eq!(store.fetch_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn ttl_beyond_clock_range_never_expires() {
    let store = Arc::new(sample_store("fraud"));
    let config = on_demand_config("fraud", u64::MAX);
    let (registry, _handle) = start(&store, config).await;

    tokio::time::sleep(Duration::from_secs(86_400)).await;
    registry.get_entity("driver", "fraud", true).await.unwrap();
    registry.list_entities("fraud", true, None).await.unwrap();
    assert_eq!(store.fetch_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn on_demand_scenario_with_late_registration() {
    let store = Arc::new(sample_store("p"));
    let (registry, _handle) = start(&store, on_demand_config("p", 5)).await;
    assert_eq!(store.fetch_count(), 1);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_not_found(&registry.get_entity("e1", "p", true).await);
    assert_eq!(store.fetch_count(), 1);

    tokio::time::sleep(Duration::from_secs(2)).await;
    store.inner().upsert(Entity::new("e1", "p")).unwrap();

    // t=3s: still the initial snapshot.
    assert_not_found(&registry.get_entity("e1", "p", true).await);

    tokio::time::sleep(Duration::from_secs(3)).await;
    let entity = registry.get_entity("e1", "p", true).await.unwrap();
    assert_eq!(entity.name, "e1");
    assert_eq!(store.fetch_count(), 2);

    registry.get_entity("e1", "p", false).await.unwrap();
    assert_eq!(store.direct_call_count(), 1);
    assert_eq!(store.fetch_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn cache_bypass_always_reaches_the_store() {
    let store = Arc::new(sample_store("fraud"));
    let (registry, _handle) = start(&store, on_demand_config("fraud", 60)).await;

    registry.refresh(None).await.unwrap();
    for _ in 0..3 {
        registry.list_entities("fraud", false, None).await.unwrap();
    }
    registry.get_infra("fraud", true).await.unwrap();

    assert_eq!(store.direct_call_count(), 4);
    assert_eq!(store.fetch_count(), 2);
    assert_eq!(registry.stats().direct_reads, 4);
}

#[tokio::test(start_paused = true)]
async fn bypass_does_not_wait_on_an_in_flight_refresh() {
    let store = Arc::new(sample_store("fraud"));
    let (registry, _handle) = start(&store, manual_config("fraud")).await;
    store.set_fetch_delay(Duration::from_secs(30));

    let refreshing = registry.clone();
    let refresh = tokio::spawn(async move { refreshing.refresh(None).await });
    tokio::task::yield_now().await;

    let started = tokio::time::Instant::now();
    registry.get_entity("driver", "fraud", false).await.unwrap();
    assert_eq!(started.elapsed(), Duration::ZERO);

    refresh.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn manual_mode_changes_only_on_explicit_refresh() {
    let store = Arc::new(sample_store("fraud"));
    let (registry, handle) = start(&store, manual_config("fraud").with_ttl_seconds(5)).await;
    assert!(!handle.is_running());

    store.inner().upsert(Entity::new("rider", "fraud")).unwrap();
    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert_not_found(&registry.get_entity("rider", "fraud", true).await);
    assert_eq!(store.fetch_count(), 1);

    registry.refresh(None).await.unwrap();
    registry.get_entity("rider", "fraud", true).await.unwrap();
    assert_eq!(store.fetch_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn background_reads_do_not_check_the_ttl() {
    let store = Arc::new(sample_store("fraud"));
    let (registry, handle) = start(&store, background_config("fraud", 60)).await;
    assert_eq!(registry.policy().mode(), RefreshMode::Background);

    // No ticks from here on; any further fetch would have to come from a read.
    handle.shutdown().await;
    tokio::time::sleep(Duration::from_secs(600)).await;

    registry.get_entity("driver", "fraud", true).await.unwrap();
    registry.list_data_sources("fraud", true, None).await.unwrap();
    assert_eq!(store.fetch_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_on_demand_refresh_propagates_and_keeps_snapshot() {
    let store = Arc::new(sample_store("fraud"));
    let (registry, _handle) = start(&store, on_demand_config("fraud", 5)).await;
    let before = registry.snapshot_info().unwrap();

    tokio::time::sleep(Duration::from_secs(6)).await;
    store.set_failing(true);
    assert_store_error(&registry.get_entity("driver", "fraud", true).await);

    let after = registry.snapshot_info().unwrap();
    assert_eq!(after.version_id, before.version_id);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(registry.stats().refresh_failures, 1);

    // Still stale, so the next read tries again.
    store.set_failing(false);
    registry.get_entity("driver", "fraud", true).await.unwrap();
    assert_eq!(store.fetch_count(), 3);
}

#[tokio::test]
async fn initial_load_failure_fails_construction() {
    let store = Arc::new(sample_store("fraud"));
    store.set_failing(true);

    let result = CachingRegistry::new(Arc::clone(&store), manual_config("fraud")).await;
    assert!(result.is_err());
}
