//! featreg Core - Registry Metadata Types
//!
//! Data types shared by the registry cache and its backing stores: the
//! metadata kinds, the tag filter, error types and cache configuration.
//! This crate contains no I/O and no concurrency.

pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod filter;
pub mod identity;

pub use config::{CacheConfig, DEFAULT_CACHE_TTL_SECONDS, DEFAULT_PROJECT};
pub use entities::{
    DataSource, DataSourceType, Entity, FeatureField, FeatureService, FeatureView,
    FeatureViewProjection, Infra, InfraObject, OnDemandFeatureView, ProjectMetadata,
    RegistryObject, SavedDataset, StreamFeatureView, ValidationReference,
};
pub use enums::{MetadataKind, RefreshMode, RefreshModeParseError};
pub use error::{ConfigError, RegistryError, RegistryResult, StoreError};
pub use filter::{has_all_tags, Tags};
pub use identity::{new_project_uuid, ProjectUuid, Timestamp};
