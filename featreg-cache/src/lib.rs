//! Feature Registry Cache
//!
//! Read-through metadata cache for a feature registry. A [`CachingRegistry`]
//! holds one immutable [`RegistrySnapshot`] of every project's metadata and
//! answers per-kind `get_*`/`list_*` reads from it, refreshing the snapshot
//! according to its [`RefreshMode`](featreg_core::RefreshMode):
//!
//! - `Background`: a task replaces the snapshot once per TTL.
//! - `OnDemand`: a read that finds the snapshot older than the TTL refreshes
//!   it first.
//! - `Manual`: only explicit [`CachingRegistry::refresh`] calls replace it.
//!
//! Reads with `allow_cache = false` always go to the [`RegistryStore`].
//!
//! Two stores ship with the crate: [`InMemoryRegistryStore`] for tests and
//! embedding, and [`JsonFileRegistryStore`] for a registry kept as one JSON
//! document.

mod accessors;
pub mod controller;
pub mod file;
pub mod freshness;
pub mod lookup;
pub mod memo;
pub mod memory;
pub mod refresh;
pub mod snapshot;
pub mod stats;
pub mod store;

pub use controller::CachingRegistry;
pub use file::JsonFileRegistryStore;
pub use freshness::RefreshPolicy;
pub use lookup::SnapshotCollection;
pub use memory::InMemoryRegistryStore;
pub use refresh::RefreshHandle;
pub use snapshot::{CachedSnapshot, RegistrySnapshot, SnapshotInfo};
pub use stats::{CacheMetrics, CacheStats};
pub use store::RegistryStore;
