//! Feature Registry Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - `InstrumentedStore`, a backing-store wrapper that counts calls and can
//!   be told to fail or to stall
//! - Proptest generators for registry objects
//! - Fixtures for common scenarios
//! - Assertions on registry results

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

pub use featreg_cache::{
    CachingRegistry, InMemoryRegistryStore, RefreshHandle, RegistrySnapshot, RegistryStore,
};
pub use featreg_core::{
    CacheConfig, DataSource, Entity, FeatureService, FeatureView, Infra, OnDemandFeatureView,
    ProjectMetadata, RefreshMode, RegistryError, RegistryResult, SavedDataset, StoreError,
    StreamFeatureView, Tags, ValidationReference,
};

// ============================================================================
// INSTRUMENTED STORE
// ============================================================================

/// Wraps a [`RegistryStore`] and records how it is used.
///
/// Snapshot fetches and per-kind (direct) calls are counted separately.
/// Fetches can be made to fail or to take a fixed amount of (tokio) time,
/// which is what concurrency and self-heal tests need.
#[derive(Debug)]
pub struct InstrumentedStore<S> {
    inner: S,
    fetches: AtomicU64,
    direct_calls: AtomicU64,
    fail_next: AtomicU64,
    failing: AtomicBool,
    fetch_delay_ms: AtomicU64,
}

impl<S: RegistryStore> InstrumentedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fetches: AtomicU64::new(0),
            direct_calls: AtomicU64::new(0),
            fail_next: AtomicU64::new(0),
            failing: AtomicBool::new(false),
            fetch_delay_ms: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Snapshot fetches attempted so far, failed ones included.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Per-kind calls made so far.
    pub fn direct_call_count(&self) -> u64 {
        self.direct_calls.load(Ordering::SeqCst)
    }

    /// Fail the next `count` snapshot fetches.
    pub fn fail_next_fetches(&self, count: u64) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Fail every snapshot fetch until switched off again.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make each snapshot fetch sleep for `delay` before answering.
    pub fn set_fetch_delay(&self, delay: Duration) {
        self.fetch_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    fn should_fail(&self) -> bool {
        if self.failing.load(Ordering::SeqCst) {
            return true;
        }
        self.fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn direct(&self) -> &S {
        self.direct_calls.fetch_add(1, Ordering::SeqCst);
        &self.inner
    }
}

#[async_trait]
impl<S: RegistryStore> RegistryStore for InstrumentedStore<S> {
    async fn fetch_snapshot(&self) -> RegistryResult<RegistrySnapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let delay_ms = self.fetch_delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        if self.should_fail() {
            return Err(StoreError::Unavailable {
                reason: "injected fetch failure".to_string(),
            }
            .into());
        }
        self.inner.fetch_snapshot().await
    }

    async fn get_data_source(&self, name: &str, project: &str) -> RegistryResult<DataSource> {
        self.direct().get_data_source(name, project).await
    }

    async fn list_data_sources(
        &self,
        project: &str,
        tags: Option<&Tags>,
    ) -> RegistryResult<Vec<DataSource>> {
        self.direct().list_data_sources(project, tags).await
    }

    async fn get_entity(&self, name: &str, project: &str) -> RegistryResult<Entity> {
        self.direct().get_entity(name, project).await
    }

    async fn list_entities(
        &self,
        project: &str,
        tags: Option<&Tags>,
    ) -> RegistryResult<Vec<Entity>> {
        self.direct().list_entities(project, tags).await
    }

    async fn get_feature_view(&self, name: &str, project: &str) -> RegistryResult<FeatureView> {
        self.direct().get_feature_view(name, project).await
    }

    async fn list_feature_views(
        &self,
        project: &str,
        tags: Option<&Tags>,
    ) -> RegistryResult<Vec<FeatureView>> {
        self.direct().list_feature_views(project, tags).await
    }

    async fn get_on_demand_feature_view(
        &self,
        name: &str,
        project: &str,
    ) -> RegistryResult<OnDemandFeatureView> {
        self.direct().get_on_demand_feature_view(name, project).await
    }

    async fn list_on_demand_feature_views(
        &self,
        project: &str,
        tags: Option<&Tags>,
    ) -> RegistryResult<Vec<OnDemandFeatureView>> {
        self.direct().list_on_demand_feature_views(project, tags).await
    }

    async fn get_stream_feature_view(
        &self,
        name: &str,
        project: &str,
    ) -> RegistryResult<StreamFeatureView> {
        self.direct().get_stream_feature_view(name, project).await
    }

    async fn list_stream_feature_views(
        &self,
        project: &str,
        tags: Option<&Tags>,
    ) -> RegistryResult<Vec<StreamFeatureView>> {
        self.direct().list_stream_feature_views(project, tags).await
    }

    async fn get_feature_service(
        &self,
        name: &str,
        project: &str,
    ) -> RegistryResult<FeatureService> {
        self.direct().get_feature_service(name, project).await
    }

    async fn list_feature_services(
        &self,
        project: &str,
        tags: Option<&Tags>,
    ) -> RegistryResult<Vec<FeatureService>> {
        self.direct().list_feature_services(project, tags).await
    }

    async fn get_saved_dataset(&self, name: &str, project: &str) -> RegistryResult<SavedDataset> {
        self.direct().get_saved_dataset(name, project).await
    }

    async fn list_saved_datasets(&self, project: &str) -> RegistryResult<Vec<SavedDataset>> {
        self.direct().list_saved_datasets(project).await
    }

    async fn get_validation_reference(
        &self,
        name: &str,
        project: &str,
    ) -> RegistryResult<ValidationReference> {
        self.direct().get_validation_reference(name, project).await
    }

    async fn list_validation_references(
        &self,
        project: &str,
    ) -> RegistryResult<Vec<ValidationReference>> {
        self.direct().list_validation_references(project).await
    }

    async fn list_project_metadata(&self, project: &str) -> RegistryResult<Vec<ProjectMetadata>> {
        self.direct().list_project_metadata(project).await
    }

    async fn get_infra(&self, project: &str) -> RegistryResult<Infra> {
        self.direct().get_infra(project).await
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for registry objects.

    use super::*;
    use proptest::prelude::*;

    /// Generate an object or project name.
    pub fn arb_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,11}"
    }

    /// Generate a small tag map drawn from a narrow key/value space, so
    /// filters and objects overlap often.
    pub fn arb_tags() -> impl Strategy<Value = Tags> {
        proptest::collection::btree_map("(team|tier|env)", "(a|b|c)", 0..3)
    }

    /// Generate a tagged entity in `project`.
    pub fn arb_entity(project: String) -> impl Strategy<Value = Entity> {
        (arb_name(), arb_tags())
            .prop_map(move |(name, tags)| Entity::new(name, project.clone()).with_tags(tags))
    }

    /// Generate a snapshot holding entities spread over two projects.
    pub fn arb_snapshot() -> impl Strategy<Value = RegistrySnapshot> {
        (
            any::<u32>(),
            proptest::collection::vec(arb_entity("alpha".to_string()), 0..8),
            proptest::collection::vec(arb_entity("beta".to_string()), 0..8),
        )
            .prop_map(|(version_id, alpha, beta)| {
                let mut snapshot = RegistrySnapshot::new(u64::from(version_id));
                snapshot.entities.extend(alpha);
                snapshot.entities.extend(beta);
                snapshot
            })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built registry contents and cache configurations.

    use super::*;

    /// Build a tag map from string pairs.
    pub fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// A snapshot with one object of every cacheable kind in `project`.
    pub fn sample_snapshot(project: &str) -> RegistrySnapshot {
        let team = tags(&[("team", "risk")]);
        let mut snapshot = RegistrySnapshot::new(1);

        snapshot
            .data_sources
            .push(DataSource::new("trips_source", project).with_tags(team.clone()));
        snapshot
            .entities
            .push(Entity::new("driver", project).with_tags(team.clone()));
        snapshot
            .feature_views
            .push(FeatureView::new("driver_stats", project).with_tags(team.clone()));
        snapshot
            .on_demand_feature_views
            .push(OnDemandFeatureView::new("driver_ratios", project));
        snapshot
            .stream_feature_views
            .push(StreamFeatureView::new("driver_stream", project));
        snapshot
            .feature_services
            .push(FeatureService::new("driver_scoring", project).with_tags(team));
        snapshot
            .saved_datasets
            .push(SavedDataset::new("training_set", project));
        snapshot
            .validation_references
            .push(ValidationReference::new("training_profile", project, "training_set"));
        snapshot
            .project_metadata
            .push(ProjectMetadata::placeholder(project));

        snapshot
    }

    /// An instrumented in-memory store holding [`sample_snapshot`].
    pub fn sample_store(project: &str) -> InstrumentedStore<InMemoryRegistryStore> {
        InstrumentedStore::new(InMemoryRegistryStore::with_snapshot(sample_snapshot(project)))
    }

    pub fn on_demand_config(project: &str, ttl_seconds: u64) -> CacheConfig {
        CacheConfig::new(project)
            .with_ttl_seconds(ttl_seconds)
            .with_mode(RefreshMode::OnDemand)
    }

    pub fn background_config(project: &str, ttl_seconds: u64) -> CacheConfig {
        CacheConfig::new(project)
            .with_ttl_seconds(ttl_seconds)
            .with_mode(RefreshMode::Background)
    }

    pub fn manual_config(project: &str) -> CacheConfig {
        CacheConfig::new(project).with_mode(RefreshMode::Manual)
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions on registry results.

    use super::*;

    /// Assert that a result is a NotFound error.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &RegistryResult<T>) {
        match result {
            Err(e) if e.is_not_found() => {}
            other => panic!("Expected NotFound error, got: {:?}", other),
        }
    }

    /// Assert that a result is a backing-store error.
    #[track_caller]
    pub fn assert_store_error<T: std::fmt::Debug>(result: &RegistryResult<T>) {
        match result {
            Err(RegistryError::Store(_)) => {}
            other => panic!("Expected Store error, got: {:?}", other),
        }
    }
}
