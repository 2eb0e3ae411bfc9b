//! Per-kind read accessors.
//!
//! One `get_*`/`list_*` pair per metadata kind. With `allow_cache` set the
//! call is answered from the cached snapshot; without it the call goes to the
//! backing store's matching method and leaves the cache alone.

use featreg_core::{
    DataSource, Entity, FeatureService, FeatureView, Infra, OnDemandFeatureView, ProjectMetadata,
    RegistryResult, SavedDataset, StreamFeatureView, Tags, ValidationReference,
};

use crate::controller::CachingRegistry;
use crate::store::RegistryStore;

/// Generates accessors for kinds whose list operation filters by tags.
macro_rules! tagged_accessors {
    ($($kind:ty => $get:ident, $list:ident;)+) => {
        $(
            #[doc = concat!("Get a `", stringify!($kind), "` by name.")]
            pub async fn $get(
                &self,
                name: &str,
                project: &str,
                allow_cache: bool,
            ) -> RegistryResult<$kind> {
                if allow_cache {
                    self.cached_get::<$kind>(name, project).await
                } else {
                    self.direct().$get(name, project).await
                }
            }

            #[doc = concat!(
                "List a project's `", stringify!($kind),
                "` objects carrying every requested tag."
            )]
            pub async fn $list(
                &self,
                project: &str,
                allow_cache: bool,
                tags: Option<&Tags>,
            ) -> RegistryResult<Vec<$kind>> {
                if allow_cache {
                    self.cached_list::<$kind>(project, tags).await
                } else {
                    self.direct().$list(project, tags).await
                }
            }
        )+
    };
}

/// Generates accessors for kinds that are listed without a tag filter.
macro_rules! untagged_accessors {
    ($($kind:ty => $get:ident, $list:ident;)+) => {
        $(
            #[doc = concat!("Get a `", stringify!($kind), "` by name.")]
            pub async fn $get(
                &self,
                name: &str,
                project: &str,
                allow_cache: bool,
            ) -> RegistryResult<$kind> {
                if allow_cache {
                    self.cached_get::<$kind>(name, project).await
                } else {
                    self.direct().$get(name, project).await
                }
            }

            #[doc = concat!("List a project's `", stringify!($kind), "` objects.")]
            pub async fn $list(
                &self,
                project: &str,
                allow_cache: bool,
            ) -> RegistryResult<Vec<$kind>> {
                if allow_cache {
                    self.cached_list::<$kind>(project, None).await
                } else {
                    self.direct().$list(project).await
                }
            }
        )+
    };
}

impl<S: RegistryStore> CachingRegistry<S> {
    tagged_accessors! {
        DataSource => get_data_source, list_data_sources;
        Entity => get_entity, list_entities;
        FeatureView => get_feature_view, list_feature_views;
        OnDemandFeatureView => get_on_demand_feature_view, list_on_demand_feature_views;
        StreamFeatureView => get_stream_feature_view, list_stream_feature_views;
        FeatureService => get_feature_service, list_feature_services;
    }

    untagged_accessors! {
        SavedDataset => get_saved_dataset, list_saved_datasets;
        ValidationReference => get_validation_reference, list_validation_references;
    }

    /// List metadata entries for a project.
    ///
    /// Cached reads include placeholder entries seeded by construction or by
    /// `refresh(Some(project))`.
    pub async fn list_project_metadata(
        &self,
        project: &str,
        allow_cache: bool,
    ) -> RegistryResult<Vec<ProjectMetadata>> {
        if allow_cache {
            self.cached_list::<ProjectMetadata>(project, None).await
        } else {
            self.direct().list_project_metadata(project).await
        }
    }

    /// Infrastructure for a project.
    ///
    /// Always read from the backing store; `allow_cache` is accepted for
    /// signature parity with the other accessors and ignored.
    pub async fn get_infra(&self, project: &str, _allow_cache: bool) -> RegistryResult<Infra> {
        self.direct().get_infra(project).await
    }
}
