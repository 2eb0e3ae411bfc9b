//! Backing store trait.
//!
//! The backing store is the authoritative source of registry metadata. The
//! cache depends only on this trait; SQL, file and remote-service stores
//! implement it.

use async_trait::async_trait;
use featreg_core::{
    DataSource, Entity, FeatureService, FeatureView, Infra, OnDemandFeatureView, ProjectMetadata,
    RegistryResult, SavedDataset, StreamFeatureView, Tags, ValidationReference,
};

use crate::snapshot::RegistrySnapshot;

/// Authoritative source of registry metadata.
///
/// `fetch_snapshot` produces the full image the cache serves from. The
/// per-kind methods are the direct path used when a caller bypasses the
/// cache; they must reflect the store's state at call time and fail with
/// `RegistryError::NotFound` for missing objects.
///
/// Implementations may be slow and must be safe to call concurrently.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Produce a fresh snapshot of the current persisted state.
    async fn fetch_snapshot(&self) -> RegistryResult<RegistrySnapshot>;

    // === Data Sources ===

    async fn get_data_source(&self, name: &str, project: &str) -> RegistryResult<DataSource>;

    async fn list_data_sources(
        &self,
        project: &str,
        tags: Option<&Tags>,
    ) -> RegistryResult<Vec<DataSource>>;

    // === Entities ===

    async fn get_entity(&self, name: &str, project: &str) -> RegistryResult<Entity>;

    async fn list_entities(&self, project: &str, tags: Option<&Tags>)
        -> RegistryResult<Vec<Entity>>;

    // === Feature Views ===

    async fn get_feature_view(&self, name: &str, project: &str) -> RegistryResult<FeatureView>;

    async fn list_feature_views(
        &self,
        project: &str,
        tags: Option<&Tags>,
    ) -> RegistryResult<Vec<FeatureView>>;

    async fn get_on_demand_feature_view(
        &self,
        name: &str,
        project: &str,
    ) -> RegistryResult<OnDemandFeatureView>;

    async fn list_on_demand_feature_views(
        &self,
        project: &str,
        tags: Option<&Tags>,
    ) -> RegistryResult<Vec<OnDemandFeatureView>>;

    async fn get_stream_feature_view(
        &self,
        name: &str,
        project: &str,
    ) -> RegistryResult<StreamFeatureView>;

    async fn list_stream_feature_views(
        &self,
        project: &str,
        tags: Option<&Tags>,
    ) -> RegistryResult<Vec<StreamFeatureView>>;

    // === Feature Services ===

    async fn get_feature_service(&self, name: &str, project: &str)
        -> RegistryResult<FeatureService>;

    async fn list_feature_services(
        &self,
        project: &str,
        tags: Option<&Tags>,
    ) -> RegistryResult<Vec<FeatureService>>;

    // === Datasets ===

    async fn get_saved_dataset(&self, name: &str, project: &str) -> RegistryResult<SavedDataset>;

    async fn list_saved_datasets(&self, project: &str) -> RegistryResult<Vec<SavedDataset>>;

    async fn get_validation_reference(
        &self,
        name: &str,
        project: &str,
    ) -> RegistryResult<ValidationReference>;

    async fn list_validation_references(
        &self,
        project: &str,
    ) -> RegistryResult<Vec<ValidationReference>>;

    // === Project Bookkeeping ===

    async fn list_project_metadata(&self, project: &str) -> RegistryResult<Vec<ProjectMetadata>>;

    /// Infrastructure for a project. A project with nothing provisioned
    /// yields an empty `Infra`, not an error.
    async fn get_infra(&self, project: &str) -> RegistryResult<Infra>;
}

/// Implements [`RegistryStore`] for a store whose direct reads are answered
/// from its current snapshot document.
///
/// The type must provide `async fn document(&self) -> RegistryResult<Arc<RegistrySnapshot>>`.
macro_rules! impl_snapshot_backed_store {
    ($type:ty) => {
        #[async_trait::async_trait]
        impl $crate::store::RegistryStore for $type {
            async fn fetch_snapshot(
                &self,
            ) -> featreg_core::RegistryResult<$crate::snapshot::RegistrySnapshot> {
                Ok(self.document().await?.as_ref().clone())
            }

            async fn get_data_source(
                &self,
                name: &str,
                project: &str,
            ) -> featreg_core::RegistryResult<featreg_core::DataSource> {
                $crate::lookup::find(&*self.document().await?, name, project)
            }

            async fn list_data_sources(
                &self,
                project: &str,
                tags: Option<&featreg_core::Tags>,
            ) -> featreg_core::RegistryResult<Vec<featreg_core::DataSource>> {
                Ok($crate::lookup::filter(&*self.document().await?, project, tags))
            }

            async fn get_entity(
                &self,
                name: &str,
                project: &str,
            ) -> featreg_core::RegistryResult<featreg_core::Entity> {
                $crate::lookup::find(&*self.document().await?, name, project)
            }

            async fn list_entities(
                &self,
                project: &str,
                tags: Option<&featreg_core::Tags>,
            ) -> featreg_core::RegistryResult<Vec<featreg_core::Entity>> {
                Ok($crate::lookup::filter(&*self.document().await?, project, tags))
            }

            async fn get_feature_view(
                &self,
                name: &str,
                project: &str,
            ) -> featreg_core::RegistryResult<featreg_core::FeatureView> {
                $crate::lookup::find(&*self.document().await?, name, project)
            }

            async fn list_feature_views(
                &self,
                project: &str,
                tags: Option<&featreg_core::Tags>,
            ) -> featreg_core::RegistryResult<Vec<featreg_core::FeatureView>> {
                Ok($crate::lookup::filter(&*self.document().await?, project, tags))
            }

            async fn get_on_demand_feature_view(
                &self,
                name: &str,
                project: &str,
            ) -> featreg_core::RegistryResult<featreg_core::OnDemandFeatureView> {
                $crate::lookup::find(&*self.document().await?, name, project)
            }

            async fn list_on_demand_feature_views(
                &self,
                project: &str,
                tags: Option<&featreg_core::Tags>,
            ) -> featreg_core::RegistryResult<Vec<featreg_core::OnDemandFeatureView>> {
                Ok($crate::lookup::filter(&*self.document().await?, project, tags))
            }

            async fn get_stream_feature_view(
                &self,
                name: &str,
                project: &str,
            ) -> featreg_core::RegistryResult<featreg_core::StreamFeatureView> {
                $crate::lookup::find(&*self.document().await?, name, project)
            }

            async fn list_stream_feature_views(
                &self,
                project: &str,
                tags: Option<&featreg_core::Tags>,
            ) -> featreg_core::RegistryResult<Vec<featreg_core::StreamFeatureView>> {
                Ok($crate::lookup::filter(&*self.document().await?, project, tags))
            }

            async fn get_feature_service(
                &self,
                name: &str,
                project: &str,
            ) -> featreg_core::RegistryResult<featreg_core::FeatureService> {
                $crate::lookup::find(&*self.document().await?, name, project)
            }

            async fn list_feature_services(
                &self,
                project: &str,
                tags: Option<&featreg_core::Tags>,
            ) -> featreg_core::RegistryResult<Vec<featreg_core::FeatureService>> {
                Ok($crate::lookup::filter(&*self.document().await?, project, tags))
            }

            async fn get_saved_dataset(
                &self,
                name: &str,
                project: &str,
            ) -> featreg_core::RegistryResult<featreg_core::SavedDataset> {
                $crate::lookup::find(&*self.document().await?, name, project)
            }

            async fn list_saved_datasets(
                &self,
                project: &str,
            ) -> featreg_core::RegistryResult<Vec<featreg_core::SavedDataset>> {
                Ok($crate::lookup::filter(&*self.document().await?, project, None))
            }

            async fn get_validation_reference(
                &self,
                name: &str,
                project: &str,
            ) -> featreg_core::RegistryResult<featreg_core::ValidationReference> {
                $crate::lookup::find(&*self.document().await?, name, project)
            }

            async fn list_validation_references(
                &self,
                project: &str,
            ) -> featreg_core::RegistryResult<Vec<featreg_core::ValidationReference>> {
                Ok($crate::lookup::filter(&*self.document().await?, project, None))
            }

            async fn list_project_metadata(
                &self,
                project: &str,
            ) -> featreg_core::RegistryResult<Vec<featreg_core::ProjectMetadata>> {
                Ok($crate::lookup::filter(&*self.document().await?, project, None))
            }

            async fn get_infra(
                &self,
                project: &str,
            ) -> featreg_core::RegistryResult<featreg_core::Infra> {
                let document = self.document().await?;
                Ok(document
                    .infra_for(project)
                    .cloned()
                    .unwrap_or_else(|| featreg_core::Infra::empty(project)))
            }
        }
    };
}

pub(crate) use impl_snapshot_backed_store;
