//! Single-slot memo for cached list results.
//!
//! Listing walks every object of a kind, so repeat lists against the same
//! snapshot are answered from the last result for that kind. The slot is
//! keyed by snapshot identity, snapshot version, project and tag filter;
//! installing a new snapshot changes the key, so nothing is ever invalidated
//! explicitly.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use featreg_core::{MetadataKind, Tags};

use crate::lookup::SnapshotCollection;
use crate::snapshot::RegistrySnapshot;

struct MemoSlot {
    // Weak keeps the allocation (and so the address) reserved without
    // keeping an old snapshot's contents alive.
    snapshot: Weak<RegistrySnapshot>,
    version_id: u64,
    project: String,
    tags: Option<Tags>,
    value: Arc<dyn Any + Send + Sync>,
}

impl MemoSlot {
    fn matches(
        &self,
        snapshot: &Arc<RegistrySnapshot>,
        project: &str,
        tags: Option<&Tags>,
    ) -> bool {
        self.snapshot.ptr_eq(&Arc::downgrade(snapshot))
            && self.version_id == snapshot.version_id
            && self.project == project
            && self.tags.as_ref() == tags
    }
}

/// Per-kind memo of the last list result.
#[derive(Default)]
pub struct ListMemo {
    slots: Mutex<HashMap<MetadataKind, MemoSlot>>,
}

impl ListMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memoised list of `T` for this snapshot, project and filter, if any.
    pub fn get<T: SnapshotCollection>(
        &self,
        snapshot: &Arc<RegistrySnapshot>,
        project: &str,
        tags: Option<&Tags>,
    ) -> Option<Arc<Vec<T>>> {
        let slots = self.slots.lock().ok()?;
        let slot = slots.get(&T::KIND)?;
        if !slot.matches(snapshot, project, tags) {
            return None;
        }
        Arc::clone(&slot.value).downcast::<Vec<T>>().ok()
    }

    /// Remember a list of `T`, replacing the previous entry for the kind.
    pub fn put<T: SnapshotCollection>(
        &self,
        snapshot: &Arc<RegistrySnapshot>,
        project: &str,
        tags: Option<&Tags>,
        value: Arc<Vec<T>>,
    ) {
        // A poisoned memo only costs a re-filter on the next list.
        let Ok(mut slots) = self.slots.lock() else {
            return;
        };
        slots.insert(
            T::KIND,
            MemoSlot {
                snapshot: Arc::downgrade(snapshot),
                version_id: snapshot.version_id,
                project: project.to_string(),
                tags: tags.cloned(),
                value,
            },
        );
    }
}
