//! Lazily populated map of resident community managers.

use std::{
    collections::{hash_map::Entry, HashMap},
    sync::Arc,
};

use parking_lot::Mutex;

use crate::{
    community::CommunityManager, error::SnapshotError, snapshot::SnapshotStore, CommunityId,
};

/// Every community the process has touched, keyed by id.
///
/// Managers are created on first reference and stay resident. A community
/// whose snapshot fails to load is not cached, so the next reference retries
/// and other communities carry on unaffected.
pub struct Registry {
    store: SnapshotStore,
    communities: Mutex<HashMap<CommunityId, Arc<CommunityManager>>>,
}

impl Registry {
    /// Create an empty registry persisting through `store`.
    pub fn new(store: SnapshotStore) -> Self {
        Self {
            store,
            communities: Mutex::new(HashMap::new()),
        }
    }

    /// Snapshot store shared by every manager.
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Return the manager for `id`, loading it on first use.
    ///
    /// The second element is `true` when this call created the manager.
    /// The snapshot is read without holding the registry lock; if two callers
    /// race on a new id, the first to finish wins and the other's load is
    /// discarded.
    pub fn get_or_load(
        &self,
        id: CommunityId,
    ) -> Result<(Arc<CommunityManager>, bool), SnapshotError> {
        if let Some(manager) = self.get(id) {
            return Ok((manager, false));
        }

        let loaded = Arc::new(CommunityManager::open(id, self.store.clone())?);
        match self.communities.lock().entry(id) {
            Entry::Occupied(resident) => Ok((Arc::clone(resident.get()), false)),
            Entry::Vacant(slot) => Ok((Arc::clone(slot.insert(loaded)), true)),
        }
    }

    /// Manager for `id` if it is already resident.
    pub fn get(&self, id: CommunityId) -> Option<Arc<CommunityManager>> {
        self.communities.lock().get(&id).cloned()
    }

    /// Ids of all resident communities, sorted.
    pub fn ids(&self) -> Vec<CommunityId> {
        let mut ids: Vec<_> = self.communities.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
