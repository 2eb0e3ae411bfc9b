//! In-memory backing store.
//!
//! Holds one snapshot document and edits it copy-on-write. Every edit bumps
//! `version_id`, so snapshots fetched before and after an edit are
//! distinguishable.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use featreg_core::{Infra, RegistryResult, StoreError};

use crate::lookup::{self, SnapshotCollection};
use crate::snapshot::RegistrySnapshot;
use crate::store::impl_snapshot_backed_store;

/// Mutable in-memory registry store.
#[derive(Debug, Default)]
pub struct InMemoryRegistryStore {
    document: RwLock<Arc<RegistrySnapshot>>,
}

impl InMemoryRegistryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with a snapshot document.
    pub fn with_snapshot(snapshot: RegistrySnapshot) -> Self {
        Self {
            document: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Current document.
    pub async fn document(&self) -> RegistryResult<Arc<RegistrySnapshot>> {
        self.current()
    }

    fn current(&self) -> RegistryResult<Arc<RegistrySnapshot>> {
        let document = self.document.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(Arc::clone(&document))
    }

    /// Apply an edit to the document and bump its version.
    ///
    /// Returns whatever the edit returns.
    pub fn update<R>(&self, edit: impl FnOnce(&mut RegistrySnapshot) -> R) -> RegistryResult<R> {
        let mut document = self.document.write().map_err(|_| StoreError::LockPoisoned)?;
        let snapshot = Arc::make_mut(&mut document);
        let result = edit(snapshot);
        snapshot.version_id += 1;
        snapshot.last_updated = Utc::now();
        Ok(result)
    }

    /// Insert or replace an object. Returns true if one was replaced.
    pub fn upsert<T: SnapshotCollection>(&self, object: T) -> RegistryResult<bool> {
        self.update(|snapshot| lookup::upsert(snapshot, object))
    }

    /// Remove an object. Returns true if one was removed.
    pub fn remove<T: SnapshotCollection>(&self, name: &str, project: &str) -> RegistryResult<bool> {
        self.update(|snapshot| lookup::remove::<T>(snapshot, name, project))
    }

    /// Record a project's infrastructure, replacing any previous record.
    pub fn set_infra(&self, infra: Infra) -> RegistryResult<()> {
        self.update(|snapshot| {
            snapshot.infra.retain(|existing| existing.project != infra.project);
            snapshot.infra.push(infra);
        })
    }
}

impl_snapshot_backed_store!(InMemoryRegistryStore);
