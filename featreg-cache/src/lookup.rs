//! Lookup helpers over a snapshot.
//!
//! Pure functions: given a snapshot, a project and optional tags, find or
//! list objects of one kind. Nothing here touches the backing store.

use featreg_core::{
    has_all_tags, DataSource, Entity, FeatureService, FeatureView, OnDemandFeatureView,
    ProjectMetadata, RegistryError, RegistryObject, RegistryResult, SavedDataset,
    StreamFeatureView, Tags, ValidationReference,
};

use crate::snapshot::RegistrySnapshot;

/// A registry object kind stored as a collection inside a snapshot.
pub trait SnapshotCollection: RegistryObject {
    /// All objects of this kind in the snapshot, across projects.
    fn collection(snapshot: &RegistrySnapshot) -> &[Self];

    /// Mutable access, used by stores that edit a snapshot document.
    fn collection_mut(snapshot: &mut RegistrySnapshot) -> &mut Vec<Self>;
}

macro_rules! snapshot_collection {
    ($type:ty, $field:ident) => {
        impl SnapshotCollection for $type {
            fn collection(snapshot: &RegistrySnapshot) -> &[Self] {
                &snapshot.$field
            }

            fn collection_mut(snapshot: &mut RegistrySnapshot) -> &mut Vec<Self> {
                &mut snapshot.$field
            }
        }
    };
}

snapshot_collection!(DataSource, data_sources);
snapshot_collection!(Entity, entities);
snapshot_collection!(FeatureView, feature_views);
snapshot_collection!(OnDemandFeatureView, on_demand_feature_views);
snapshot_collection!(StreamFeatureView, stream_feature_views);
snapshot_collection!(FeatureService, feature_services);
snapshot_collection!(SavedDataset, saved_datasets);
snapshot_collection!(ValidationReference, validation_references);
snapshot_collection!(ProjectMetadata, project_metadata);

/// Find the object of kind `T` named `name` in `project`.
pub fn find<T: SnapshotCollection>(
    snapshot: &RegistrySnapshot,
    name: &str,
    project: &str,
) -> RegistryResult<T> {
    T::collection(snapshot)
        .iter()
        .find(|object| object.project() == project && object.name() == name)
        .cloned()
        .ok_or_else(|| RegistryError::not_found(T::KIND, name, project))
}

/// List the objects of kind `T` in `project` that carry every requested tag.
///
/// Kinds without tags ignore the filter.
pub fn filter<T: SnapshotCollection>(
    snapshot: &RegistrySnapshot,
    project: &str,
    tags: Option<&Tags>,
) -> Vec<T> {
    let tags = if T::KIND.supports_tags() { tags } else { None };
    T::collection(snapshot)
        .iter()
        .filter(|object| object.project() == project)
        .filter(|object| match object.tags() {
            Some(object_tags) => has_all_tags(object_tags, tags),
            None => true,
        })
        .cloned()
        .collect()
}

/// Insert `object`, replacing any object of the same kind, name and project.
///
/// Returns true if an existing object was replaced.
pub fn upsert<T: SnapshotCollection>(snapshot: &mut RegistrySnapshot, object: T) -> bool {
    let items = T::collection_mut(snapshot);
    match items
        .iter_mut()
        .find(|existing| existing.project() == object.project() && existing.name() == object.name())
    {
        Some(existing) => {
            *existing = object;
            true
        }
        None => {
            items.push(object);
            false
        }
    }
}

/// Remove the object of kind `T` named `name` in `project`.
///
/// Returns true if something was removed.
pub fn remove<T: SnapshotCollection>(
    snapshot: &mut RegistrySnapshot,
    name: &str,
    project: &str,
) -> bool {
    let items = T::collection_mut(snapshot);
    let before = items.len();
    items.retain(|object| !(object.project() == project && object.name() == name));
    items.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use featreg_core::MetadataKind;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn sample() -> RegistrySnapshot {
        let mut snapshot = RegistrySnapshot::new(1);
        snapshot
            .entities
            .push(Entity::new("driver", "fraud").with_tags(tags(&[("team", "risk")])));
        snapshot.entities.push(Entity::new("customer", "fraud"));
        snapshot.entities.push(Entity::new("driver", "ads"));
        snapshot
            .saved_datasets
            .push(SavedDataset::new("training", "fraud"));
        snapshot
    }

    #[test]
    fn test_find_matches_name_and_project() {
        let snapshot = sample();
        let entity: Entity = find(&snapshot, "driver", "ads").unwrap();
        assert_eq!(entity.project, "ads");
    }

    #[test]
    fn test_find_missing_is_not_found() {
        let snapshot = sample();
        let err = find::<Entity>(&snapshot, "merchant", "fraud").unwrap_err();
        assert_eq!(
            err,
            RegistryError::not_found(MetadataKind::Entity, "merchant", "fraud")
        );
    }

    #[test]
    fn test_find_does_not_cross_projects() {
        let snapshot = sample();
        assert!(find::<Entity>(&snapshot, "customer", "ads").is_err());
    }

    #[test]
    fn test_filter_by_project() {
        let snapshot = sample();
        let entities: Vec<Entity> = filter(&snapshot, "fraud", None);
        assert_eq!(entities.len(), 2);
        assert!(entities.iter().all(|e| e.project == "fraud"));
    }

    #[test]
    fn test_filter_by_tags() {
        let snapshot = sample();
        let risk = tags(&[("team", "risk")]);
        let entities: Vec<Entity> = filter(&snapshot, "fraud", Some(&risk));
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "driver");

        let everything: Vec<Entity> = filter(&snapshot, "fraud", Some(&Tags::new()));
        assert_eq!(everything.len(), 2);
    }

    #[test]
    fn test_filter_untagged_kind_ignores_tags() {
        let snapshot = sample();
        let risk = tags(&[("team", "risk")]);
        let datasets: Vec<SavedDataset> = filter(&snapshot, "fraud", Some(&risk));
        assert_eq!(datasets.len(), 1);
    }

    #[test]
    fn test_upsert_and_remove() {
        let mut snapshot = sample();
        let updated = Entity::new("customer", "fraud").with_tags(tags(&[("tier", "gold")]));
        assert!(upsert(&mut snapshot, updated));
        assert!(!upsert(&mut snapshot, Entity::new("merchant", "fraud")));

        let customer: Entity = find(&snapshot, "customer", "fraud").unwrap();
        assert_eq!(customer.tags.get("tier").map(String::as_str), Some("gold"));

        assert!(remove::<Entity>(&mut snapshot, "merchant", "fraud"));
        assert!(!remove::<Entity>(&mut snapshot, "merchant", "fraud"));
        assert_eq!(snapshot.entities.len(), 3);
    }
}
