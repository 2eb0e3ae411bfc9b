//! Registry snapshots and the cached copy held by the controller.
//!
//! A [`RegistrySnapshot`] is the full metadata image for every project at one
//! point in time. Once it is wrapped in an `Arc` it is never mutated; changes
//! produce a new snapshot.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use featreg_core::{
    DataSource, Entity, FeatureService, FeatureView, Infra, OnDemandFeatureView, ProjectMetadata,
    SavedDataset, StreamFeatureView, Timestamp, ValidationReference,
};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Full registry metadata image for all projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Identifies the content of this snapshot. Stores bump it on every change.
    #[serde(default)]
    pub version_id: u64,
    #[serde(default = "Utc::now")]
    pub last_updated: Timestamp,
    #[serde(default)]
    pub data_sources: Vec<DataSource>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub feature_views: Vec<FeatureView>,
    #[serde(default)]
    pub on_demand_feature_views: Vec<OnDemandFeatureView>,
    #[serde(default)]
    pub stream_feature_views: Vec<StreamFeatureView>,
    #[serde(default)]
    pub feature_services: Vec<FeatureService>,
    #[serde(default)]
    pub saved_datasets: Vec<SavedDataset>,
    #[serde(default)]
    pub validation_references: Vec<ValidationReference>,
    #[serde(default)]
    pub project_metadata: Vec<ProjectMetadata>,
    #[serde(default)]
    pub infra: Vec<Infra>,
}

impl Default for RegistrySnapshot {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RegistrySnapshot {
    /// Create an empty snapshot with the given version.
    pub fn new(version_id: u64) -> Self {
        Self {
            version_id,
            last_updated: Utc::now(),
            data_sources: Vec::new(),
            entities: Vec::new(),
            feature_views: Vec::new(),
            on_demand_feature_views: Vec::new(),
            stream_feature_views: Vec::new(),
            feature_services: Vec::new(),
            saved_datasets: Vec::new(),
            validation_references: Vec::new(),
            project_metadata: Vec::new(),
            infra: Vec::new(),
        }
    }

    /// Metadata entry for a project, if the project is known.
    pub fn project_metadata_for(&self, project: &str) -> Option<&ProjectMetadata> {
        self.project_metadata.iter().find(|pm| pm.project == project)
    }

    /// Whether the snapshot has a metadata entry for `project`.
    pub fn has_project(&self, project: &str) -> bool {
        self.project_metadata_for(project).is_some()
    }

    /// Add a placeholder metadata entry for `project` unless one exists.
    ///
    /// Returns true if an entry was added.
    pub fn init_project_metadata(&mut self, project: &str) -> bool {
        if self.has_project(project) {
            return false;
        }
        self.project_metadata
            .push(ProjectMetadata::placeholder(project));
        true
    }

    /// Infra recorded for a project, if any.
    pub fn infra_for(&self, project: &str) -> Option<&Infra> {
        self.infra.iter().find(|infra| infra.project == project)
    }

    /// Total number of metadata objects across all kinds.
    pub fn object_count(&self) -> usize {
        self.data_sources.len()
            + self.entities.len()
            + self.feature_views.len()
            + self.on_demand_feature_views.len()
            + self.stream_feature_views.len()
            + self.feature_services.len()
            + self.saved_datasets.len()
            + self.validation_references.len()
            + self.project_metadata.len()
            + self.infra.len()
    }
}

/// The snapshot currently served by the cache, paired with when it was loaded.
///
/// The controller swaps whole `Arc<CachedSnapshot>` values, so the snapshot
/// and its timestamps are always observed together.
#[derive(Debug)]
pub struct CachedSnapshot {
    snapshot: Arc<RegistrySnapshot>,
    created_at: Timestamp,
    loaded_at: Instant,
}

impl CachedSnapshot {
    /// Pair a freshly loaded snapshot with the current time.
    pub fn loaded_now(snapshot: Arc<RegistrySnapshot>) -> Self {
        Self {
            snapshot,
            created_at: Utc::now(),
            loaded_at: Instant::now(),
        }
    }

    /// Replace the snapshot but keep the original load times.
    ///
    /// Used when the controller amends the cached copy (project seeding)
    /// without having fetched anything new.
    pub fn amended(&self, snapshot: Arc<RegistrySnapshot>) -> Self {
        Self {
            snapshot,
            created_at: self.created_at,
            loaded_at: self.loaded_at,
        }
    }

    pub fn snapshot(&self) -> &Arc<RegistrySnapshot> {
        &self.snapshot
    }

    /// Wall-clock time the snapshot was loaded.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Monotonic time the snapshot was loaded, used for staleness checks.
    pub fn loaded_at(&self) -> Instant {
        self.loaded_at
    }

    /// Time elapsed since the snapshot was loaded.
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.loaded_at)
    }

    pub fn info(&self) -> SnapshotInfo {
        SnapshotInfo {
            version_id: self.snapshot.version_id,
            created_at: self.created_at,
            age: self.age(),
            object_count: self.snapshot.object_count(),
        }
    }
}

/// Description of the snapshot currently served by the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotInfo {
    pub version_id: u64,
    pub created_at: Timestamp,
    pub age: Duration,
    pub object_count: usize,
}
