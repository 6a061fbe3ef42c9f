//! In-process backend implementation.
//!
//! Keeps its own registry of storage-layer holds, independent of the lock
//! table that mirrors it. External holders can be seeded to simulate locks
//! taken outside the manager's visibility, unlocks can be forced to fail, and
//! every `discard_changes` call is recorded so release side effects are
//! observable. Used by tests and by single-process embeddings that have no
//! real storage system behind them.

use super::{BackendDenial, DatastoreBackend};
use crate::datastore::Datastore;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// Name recorded for holds taken through [`DatastoreBackend::lock`], as
/// opposed to seeded external holders.
const LOCAL_OWNER: &str = "local";

#[derive(Default)]
struct Registry {
    /// Current storage-layer holder per datastore.
    holds: HashMap<Datastore, String>,
    /// Datastores whose next unlock is refused.
    refuse_unlock: HashSet<Datastore>,
    /// Every discard_changes call, in order.
    discarded: Vec<Datastore>,
}

/// Backend that enforces locks in process memory.
#[derive(Default)]
pub struct MemoryBackend {
    registry: Mutex<Registry>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hold taken outside the manager, e.g. by another process
    /// talking to the same storage. Subsequent `lock` calls for `datastore`
    /// are denied with a message naming `owner`.
    pub fn seed_external_lock(&self, datastore: Datastore, owner: &str) {
        self.registry
            .lock()
            .holds
            .insert(datastore, owner.to_string());
    }

    /// Make the next `unlock` of `datastore` fail, as a storage system does
    /// when its own record disagrees with the caller's.
    pub fn refuse_unlock(&self, datastore: Datastore) {
        self.registry.lock().refuse_unlock.insert(datastore);
    }

    /// Whether the storage layer currently records a hold on `datastore`.
    pub fn is_locked(&self, datastore: Datastore) -> bool {
        self.registry.lock().holds.contains_key(&datastore)
    }

    /// The datastores `discard_changes` has been called for, in call order.
    pub fn discarded(&self) -> Vec<Datastore> {
        self.registry.lock().discarded.clone()
    }
}

impl DatastoreBackend for MemoryBackend {
    fn lock(&self, datastore: Datastore) -> Result<(), BackendDenial> {
        let mut registry = self.registry.lock();
        if let Some(owner) = registry.holds.get(&datastore) {
            return Err(
                BackendDenial::new(format!("datastore '{}' is locked", datastore))
                    .with_detail(format!("held by {}", owner)),
            );
        }
        registry.holds.insert(datastore, LOCAL_OWNER.to_string());
        Ok(())
    }

    fn unlock(&self, datastore: Datastore) -> Result<(), BackendDenial> {
        let mut registry = self.registry.lock();
        if registry.refuse_unlock.remove(&datastore) {
            return Err(BackendDenial::new(format!(
                "unlock of datastore '{}' refused",
                datastore
            )));
        }
        match registry.holds.get(&datastore).cloned() {
            Some(owner) if owner == LOCAL_OWNER => {
                registry.holds.remove(&datastore);
                Ok(())
            }
            Some(owner) => Err(BackendDenial::new(format!(
                "datastore '{}' is locked by another entity",
                datastore
            ))
            .with_detail(format!("held by {}", owner))),
            None => Err(BackendDenial::new(format!(
                "datastore '{}' is not locked",
                datastore
            ))),
        }
    }

    fn discard_changes(&self, datastore: Datastore) {
        self.registry.lock().discarded.push(datastore);
    }
}
