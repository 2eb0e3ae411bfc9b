//! Registry metadata objects
//!
//! These are deliberately thin: the cache only relies on the name, project
//! and tags of each object. Kind-specific fields exist so that stores and
//! callers can round-trip realistic documents.

use crate::{new_project_uuid, MetadataKind, ProjectUuid, Tags, Timestamp};
use serde::{Deserialize, Serialize};

/// Common surface of every registry object the cache can serve.
pub trait RegistryObject: Clone + Send + Sync + 'static {
    /// The kind this type represents.
    const KIND: MetadataKind;

    /// Name of the object, unique within a project and kind.
    fn name(&self) -> &str;

    /// Project the object belongs to.
    fn project(&self) -> &str;

    /// Tags used by list filters. Kinds without tags return `None`.
    fn tags(&self) -> Option<&Tags> {
        None
    }
}

/// Implements `RegistryObject` for a struct with `name`, `project` and `tags` fields.
macro_rules! impl_tagged_object {
    ($type:ty, $kind:expr) => {
        impl RegistryObject for $type {
            const KIND: MetadataKind = $kind;

            fn name(&self) -> &str {
                &self.name
            }

            fn project(&self) -> &str {
                &self.project
            }

            fn tags(&self) -> Option<&Tags> {
                Some(&self.tags)
            }
        }
    };
}

// ============================================================================
// DATA SOURCES AND ENTITIES
// ============================================================================

/// Where a data source reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceType {
    #[default]
    Batch,
    Stream,
    Request,
    Push,
}

/// A source of feature data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    pub name: String,
    pub project: String,
    #[serde(default)]
    pub source_type: DataSourceType,
    #[serde(default)]
    pub timestamp_field: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub tags: Tags,
}

impl DataSource {
    pub fn new(name: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project: project.into(),
            source_type: DataSourceType::default(),
            timestamp_field: None,
            description: String::new(),
            owner: String::new(),
            tags: Tags::new(),
        }
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }
}

impl_tagged_object!(DataSource, MetadataKind::DataSource);

/// A collection of join keys features are keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub project: String,
    #[serde(default)]
    pub join_keys: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub tags: Tags,
}

impl Entity {
    pub fn new(name: impl Into<String>, project: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            join_keys: vec![name.clone()],
            name,
            project: project.into(),
            description: String::new(),
            owner: String::new(),
            tags: Tags::new(),
        }
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }
}

impl_tagged_object!(Entity, MetadataKind::Entity);

// ============================================================================
// FEATURE VIEWS
// ============================================================================

/// A named, typed column of a feature view schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureField {
    pub name: String,
    pub dtype: String,
}

/// A group of features computed from a batch source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureView {
    pub name: String,
    pub project: String,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub schema: Vec<FeatureField>,
    #[serde(default)]
    pub batch_source: Option<String>,
    /// Feature freshness window; `None` means features never expire.
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
    #[serde(default = "default_online")]
    pub online: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub tags: Tags,
}

fn default_online() -> bool {
    true
}

impl FeatureView {
    pub fn new(name: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project: project.into(),
            entities: Vec::new(),
            schema: Vec::new(),
            batch_source: None,
            ttl_seconds: None,
            online: true,
            description: String::new(),
            owner: String::new(),
            tags: Tags::new(),
        }
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }
}

impl_tagged_object!(FeatureView, MetadataKind::FeatureView);

/// A feature view whose values are computed at request time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnDemandFeatureView {
    pub name: String,
    pub project: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub schema: Vec<FeatureField>,
    /// Transformation mode, e.g. `python` or `pandas`.
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub tags: Tags,
}

impl OnDemandFeatureView {
    pub fn new(name: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project: project.into(),
            sources: Vec::new(),
            schema: Vec::new(),
            mode: "python".to_string(),
            description: String::new(),
            owner: String::new(),
            tags: Tags::new(),
        }
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }
}

impl_tagged_object!(OnDemandFeatureView, MetadataKind::OnDemandFeatureView);

/// A feature view fed by a stream source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFeatureView {
    pub name: String,
    pub project: String,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub schema: Vec<FeatureField>,
    #[serde(default)]
    pub stream_source: Option<String>,
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub tags: Tags,
}

impl StreamFeatureView {
    pub fn new(name: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project: project.into(),
            entities: Vec::new(),
            schema: Vec::new(),
            stream_source: None,
            ttl_seconds: None,
            description: String::new(),
            owner: String::new(),
            tags: Tags::new(),
        }
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }
}

impl_tagged_object!(StreamFeatureView, MetadataKind::StreamFeatureView);

// ============================================================================
// FEATURE SERVICES
// ============================================================================

/// Selection of features from one feature view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureViewProjection {
    pub feature_view_name: String,
    /// Selected feature names; empty selects the whole view.
    #[serde(default)]
    pub features: Vec<String>,
}

/// A named bundle of features served together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureService {
    pub name: String,
    pub project: String,
    #[serde(default)]
    pub features: Vec<FeatureViewProjection>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub tags: Tags,
}

impl FeatureService {
    pub fn new(name: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project: project.into(),
            features: Vec::new(),
            description: String::new(),
            owner: String::new(),
            tags: Tags::new(),
        }
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }
}

impl_tagged_object!(FeatureService, MetadataKind::FeatureService);

// ============================================================================
// DATASETS
// ============================================================================

/// A materialized training dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedDataset {
    pub name: String,
    pub project: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub join_keys: Vec<String>,
    /// Storage location of the dataset.
    #[serde(default)]
    pub storage: String,
}

impl SavedDataset {
    pub fn new(name: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project: project.into(),
            features: Vec::new(),
            join_keys: Vec::new(),
            storage: String::new(),
        }
    }
}

impl RegistryObject for SavedDataset {
    const KIND: MetadataKind = MetadataKind::SavedDataset;

    fn name(&self) -> &str {
        &self.name
    }

    fn project(&self) -> &str {
        &self.project
    }
}

/// A profile of a saved dataset used to validate new data against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReference {
    pub name: String,
    pub project: String,
    pub dataset_name: String,
    #[serde(default)]
    pub profiler: String,
    #[serde(default)]
    pub description: String,
}

impl ValidationReference {
    pub fn new(
        name: impl Into<String>,
        project: impl Into<String>,
        dataset_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            project: project.into(),
            dataset_name: dataset_name.into(),
            profiler: String::new(),
            description: String::new(),
        }
    }
}

impl RegistryObject for ValidationReference {
    const KIND: MetadataKind = MetadataKind::ValidationReference;

    fn name(&self) -> &str {
        &self.name
    }

    fn project(&self) -> &str {
        &self.project
    }
}

// ============================================================================
// PROJECT BOOKKEEPING
// ============================================================================

/// Registry bookkeeping for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub project: String,
    pub project_uuid: ProjectUuid,
    #[serde(default)]
    pub last_updated: Option<Timestamp>,
}

impl ProjectMetadata {
    /// Placeholder entry for a project that has not been materialized yet.
    pub fn placeholder(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            project_uuid: new_project_uuid(),
            last_updated: None,
        }
    }
}

impl RegistryObject for ProjectMetadata {
    const KIND: MetadataKind = MetadataKind::ProjectMetadata;

    fn name(&self) -> &str {
        &self.project
    }

    fn project(&self) -> &str {
        &self.project
    }
}

/// One piece of provisioned infrastructure (a table, a topic, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfraObject {
    pub name: String,
    pub object_type: String,
}

/// Infrastructure provisioned for a project.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Infra {
    pub project: String,
    #[serde(default)]
    pub objects: Vec<InfraObject>,
}

impl Infra {
    /// Infra for a project with nothing provisioned.
    pub fn empty(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            objects: Vec::new(),
        }
    }
}

impl RegistryObject for Infra {
    const KIND: MetadataKind = MetadataKind::Infra;

    fn name(&self) -> &str {
        &self.project
    }

    fn project(&self) -> &str {
        &self.project
    }
}
