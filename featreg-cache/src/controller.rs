//! Cache controller: owns the current snapshot and decides when to replace it.
//!
//! Reads clone the current `Arc<CachedSnapshot>` out of a short-lived
//! `RwLock` and never hold it across an await. Every replacement goes through
//! `refresh_lock`, an async mutex held for the whole backing-store fetch, so
//! at most one refresh is in flight and waiters observe its result instead
//! of fetching again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use featreg_core::{CacheConfig, RegistryResult, StoreError, Tags};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::freshness::RefreshPolicy;
use crate::lookup::{self, SnapshotCollection};
use crate::memo::ListMemo;
use crate::refresh::{self, RefreshHandle};
use crate::snapshot::{CachedSnapshot, RegistrySnapshot, SnapshotInfo};
use crate::stats::{CacheMetrics, CacheStats};
use crate::store::RegistryStore;

/// Read-through snapshot cache in front of a [`RegistryStore`].
///
/// Every per-kind accessor takes an `allow_cache` flag:
///
/// - `false`: the call goes straight to the backing store and never touches
///   the snapshot or the refresh lock.
/// - `true`: the call is answered from the current snapshot. Under
///   [`RefreshMode::OnDemand`](featreg_core::RefreshMode::OnDemand) a stale
///   snapshot is refreshed first; under `Background` and `Manual` the
///   snapshot in hand is served even if it is older than the TTL.
///
/// Cloning is cheap and clones share the same snapshot.
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(InMemoryRegistryStore::new());
/// let config = CacheConfig::new("fraud")
///     .with_ttl_seconds(60)
///     .with_mode(RefreshMode::Background);
/// let (registry, refresh_handle) = CachingRegistry::new(store, config).await?;
///
/// let driver = registry.get_entity("driver", "fraud", true).await?;
///
/// // On shutdown
/// refresh_handle.shutdown().await;
/// ```
pub struct CachingRegistry<S: RegistryStore> {
    inner: Arc<RegistryInner<S>>,
}

pub(crate) struct RegistryInner<S: RegistryStore> {
    store: Arc<S>,
    policy: RefreshPolicy,
    project: String,
    state: RwLock<Arc<CachedSnapshot>>,
    refresh_lock: Mutex<()>,
    memo: ListMemo,
    metrics: CacheMetrics,
    background_started: AtomicBool,
}

impl<S: RegistryStore + 'static> CachingRegistry<S> {
    /// Load the initial snapshot and start the cache.
    ///
    /// The configured project gets a placeholder metadata entry if the store
    /// does not know it yet. In background mode with a non-zero TTL a refresh
    /// task is spawned on the current tokio runtime and the returned handle
    /// owns it: dropping the handle stops background refresh, leaving the
    /// cache to change only on explicit `refresh` calls. In every other case
    /// the handle is inert.
    ///
    /// Fails if the configuration is invalid or the initial fetch fails.
    pub async fn new(store: Arc<S>, config: CacheConfig) -> RegistryResult<(Self, RefreshHandle)> {
        config.validate()?;
        let policy = RefreshPolicy::from_config(&config);

        let mut snapshot = store.fetch_snapshot().await?;
        snapshot.init_project_metadata(&config.project);
        let version_id = snapshot.version_id;

        let inner = Arc::new(RegistryInner {
            store,
            policy,
            project: config.project,
            state: RwLock::new(Arc::new(CachedSnapshot::loaded_now(Arc::new(snapshot)))),
            refresh_lock: Mutex::new(()),
            memo: ListMemo::new(),
            metrics: CacheMetrics::new(),
            background_started: AtomicBool::new(false),
        });
        inner.metrics.record_refresh();

        tracing::info!(
            project = %inner.project,
            ttl_secs = policy.ttl().as_secs(),
            mode = %policy.mode(),
            version_id,
            "Registry cache loaded"
        );

        let handle = match policy.background_period() {
            Some(period) => refresh::spawn_background_refresh(&inner, period),
            None => RefreshHandle::inert(),
        };

        Ok((Self { inner }, handle))
    }
}

impl<S: RegistryStore> CachingRegistry<S> {
    /// Fetch a new snapshot and replace the current one.
    ///
    /// If `project` is given and the current snapshot has no metadata entry
    /// for it, a placeholder entry is installed before the fetch, so a
    /// project that was just registered is not reported absent while the
    /// store catches up. On failure the previous snapshot stays installed
    /// and the error is returned.
    pub async fn refresh(&self, project: Option<&str>) -> RegistryResult<()> {
        let _guard = self.inner.refresh_lock.lock().await;
        self.inner.refresh_locked(project).await
    }

    /// The snapshot currently served.
    pub fn current_snapshot(&self) -> RegistryResult<Arc<RegistrySnapshot>> {
        Ok(Arc::clone(self.inner.current()?.snapshot()))
    }

    /// Version, load time and age of the current snapshot.
    pub fn snapshot_info(&self) -> RegistryResult<SnapshotInfo> {
        Ok(self.inner.current()?.info())
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.metrics.snapshot()
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.inner.policy
    }

    /// Project seeded at construction.
    pub fn project(&self) -> &str {
        &self.inner.project
    }

    /// The backing store, for a read that bypasses the snapshot.
    pub(crate) fn direct(&self) -> &S {
        self.inner.metrics.record_direct_read();
        &self.inner.store
    }

    pub(crate) async fn cached_get<T: SnapshotCollection>(
        &self,
        name: &str,
        project: &str,
    ) -> RegistryResult<T> {
        self.inner.ensure_fresh().await?;
        let cached = self.inner.current()?;
        self.inner.metrics.record_cached_read();
        lookup::find(cached.snapshot(), name, project)
    }

    pub(crate) async fn cached_list<T: SnapshotCollection>(
        &self,
        project: &str,
        tags: Option<&Tags>,
    ) -> RegistryResult<Vec<T>> {
        self.inner.ensure_fresh().await?;
        let cached = self.inner.current()?;
        self.inner.metrics.record_cached_read();

        let snapshot = cached.snapshot();
        if let Some(hit) = self.inner.memo.get::<T>(snapshot, project, tags) {
            self.inner.metrics.record_memo_hit();
            return Ok(hit.as_ref().clone());
        }

        let items = lookup::filter::<T>(snapshot, project, tags);
        self.inner
            .memo
            .put(snapshot, project, tags, Arc::new(items.clone()));
        Ok(items)
    }
}

impl<S: RegistryStore> Clone for CachingRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: RegistryStore> RegistryInner<S> {
    fn current(&self) -> RegistryResult<Arc<CachedSnapshot>> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(Arc::clone(&state))
    }

    fn install(&self, cached: CachedSnapshot) -> RegistryResult<()> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        *state = Arc::new(cached);
        Ok(())
    }

    /// Install a copy of the current snapshot with a placeholder entry for
    /// `project`, keeping the original load times.
    fn seed_project(&self, project: &str) -> RegistryResult<()> {
        let current = self.current()?;
        if current.snapshot().has_project(project) {
            return Ok(());
        }

        let mut seeded = current.snapshot().as_ref().clone();
        seeded.init_project_metadata(project);
        self.install(current.amended(Arc::new(seeded)))?;

        tracing::debug!(project, "Seeded placeholder project metadata");
        Ok(())
    }

    /// Refresh body. Callers must hold `refresh_lock`.
    async fn refresh_locked(&self, project: Option<&str>) -> RegistryResult<()> {
        if let Some(project) = project {
            self.seed_project(project)?;
        }

        match self.store.fetch_snapshot().await {
            Ok(snapshot) => {
                let version_id = snapshot.version_id;
                self.install(CachedSnapshot::loaded_now(Arc::new(snapshot)))?;
                self.metrics.record_refresh();
                tracing::debug!(version_id, "Registry cache refreshed");
                Ok(())
            }
            Err(e) => {
                self.metrics.record_refresh_failure();
                tracing::warn!(error = %e, "Registry snapshot fetch failed");
                Err(e)
            }
        }
    }

    /// Refresh the snapshot first if an on-demand cache has let it go stale.
    async fn ensure_fresh(&self) -> RegistryResult<()> {
        if !self.policy.checks_on_read() {
            return Ok(());
        }

        let _guard = self.refresh_lock.lock().await;
        let current = self.current()?;
        if self.policy.is_stale(current.loaded_at(), Instant::now()) {
            tracing::info!(
                age_ms = current.age().as_millis() as u64,
                "Registry cache expired, refreshing"
            );
            self.refresh_locked(None).await?;
        }
        Ok(())
    }

    /// One tick of the background task. Failures are logged and swallowed.
    pub(crate) async fn scheduled_refresh(&self) {
        let _guard = self.refresh_lock.lock().await;
        if let Err(e) = self.refresh_locked(None).await {
            tracing::error!(
                error = %e,
                project = %self.project,
                "Scheduled registry refresh failed, keeping previous snapshot"
            );
        }
    }

    /// Claim the right to run the background task. Only the first call wins.
    pub(crate) fn claim_background_task(&self) -> bool {
        !self.background_started.swap(true, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRegistryStore;
    use featreg_core::{Entity, RefreshMode, RegistryError};
    use std::time::Duration;

    async fn registry(
        store: &Arc<InMemoryRegistryStore>,
        ttl_seconds: u64,
        mode: RefreshMode,
    ) -> CachingRegistry<InMemoryRegistryStore> {
        let config = CacheConfig::new("fraud")
            .with_ttl_seconds(ttl_seconds)
            .with_mode(mode);
        let (registry, _handle) = CachingRegistry::new(Arc::clone(store), config)
            .await
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_construction_seeds_project() {
        let store = Arc::new(InMemoryRegistryStore::new());
        let registry = registry(&store, 60, RefreshMode::OnDemand).await;

        assert!(registry.current_snapshot().unwrap().has_project("fraud"));
        assert_eq!(registry.stats().refreshes, 1);
        assert_eq!(registry.project(), "fraud");
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let store = Arc::new(InMemoryRegistryStore::new());
        let result = CachingRegistry::new(store, CacheConfig::new("")).await;
        assert!(matches!(result, Err(RegistryError::Config(_))));
    }

    #[tokio::test]
    async fn test_refresh_with_unknown_project_installs_fetched_snapshot() {
        let store = Arc::new(InMemoryRegistryStore::new());
        let registry = registry(&store, 0, RefreshMode::Manual).await;
        let before = registry.current_snapshot().unwrap();
        assert!(!before.has_project("ads"));

        registry.refresh(Some("ads")).await.unwrap();

        // The store never learned about "ads", so the fetched snapshot drops it again.
        assert!(!registry.current_snapshot().unwrap().has_project("ads"));
        assert_eq!(registry.stats().refreshes, 2);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = Arc::new(InMemoryRegistryStore::new());
        let registry = registry(&store, 0, RefreshMode::Manual).await;
        let clone = registry.clone();

        store.upsert(Entity::new("driver", "fraud")).unwrap();
        registry.refresh(None).await.unwrap();

        let entity: Entity = clone.cached_get("driver", "fraud").await.unwrap();
        assert_eq!(entity.name, "driver");
    }

    #[tokio::test]
    async fn test_cached_list_uses_memo_until_snapshot_changes() {
        let store = Arc::new(InMemoryRegistryStore::new());
        store.upsert(Entity::new("driver", "fraud")).unwrap();
        let registry = registry(&store, 0, RefreshMode::Manual).await;

        let first: Vec<Entity> = registry.cached_list("fraud", None).await.unwrap();
        let second: Vec<Entity> = registry.cached_list("fraud", None).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.stats().memo_hits, 1);

        store.upsert(Entity::new("customer", "fraud")).unwrap();
        registry.refresh(None).await.unwrap();
        let third: Vec<Entity> = registry.cached_list("fraud", None).await.unwrap();
        assert_eq!(third.len(), 2);
        assert_eq!(registry.stats().memo_hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_info_tracks_age() {
        let store = Arc::new(InMemoryRegistryStore::new());
        let registry = registry(&store, 0, RefreshMode::Manual).await;

        tokio::time::advance(Duration::from_secs(4)).await;
        let info = registry.snapshot_info().unwrap();
        assert_eq!(info.age, Duration::from_secs(4));
        assert_eq!(info.object_count, 1);
    }

    #[test]
    fn test_background_task_claimed_once() {
        let inner = RegistryInner {
            store: Arc::new(InMemoryRegistryStore::new()),
            policy: RefreshPolicy::new(Duration::from_secs(1), RefreshMode::Background),
            project: "fraud".to_string(),
            state: RwLock::new(Arc::new(CachedSnapshot::loaded_now(Arc::new(
                RegistrySnapshot::new(0),
            )))),
            refresh_lock: Mutex::new(()),
            memo: ListMemo::new(),
            metrics: CacheMetrics::new(),
            background_started: AtomicBool::new(false),
        };
        assert!(inner.claim_background_task());
        assert!(!inner.claim_background_task());
    }
}
