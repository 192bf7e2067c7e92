//! Advisory per-entity locks
//!
//! Serializes concurrent updates of the same (resource, id) pair inside one process. Clones
//! share one registry. [`EntityLocks::shared`] returns the process-wide registry every
//! planner uses unless it is handed another one.

use super::constants::Resource;
use log::debug;
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Identity of a lockable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    pub resource: Resource,
    pub id: u64,
}

impl EntityKey {
    pub fn new(resource: Resource, id: u64) -> Self {
        Self { resource, id }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.resource.name(), self.id)
    }
}

type Registry = HashMap<EntityKey, Arc<AsyncMutex<()>>>;

static SHARED: Lazy<EntityLocks> = Lazy::new(EntityLocks::new);

/// Registry of held entity locks
#[derive(Debug, Clone, Default)]
pub struct EntityLocks {
    registry: Arc<Mutex<Registry>>,
}

impl EntityLocks {
    /// A private registry, independent of every other one
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn shared() -> Self {
        SHARED.clone()
    }

    /// Whether both handles point at the same registry
    pub fn same_registry(&self, other: &EntityLocks) -> bool {
        Arc::ptr_eq(&self.registry, &other.registry)
    }

    /// Wait until the entity is free and take it.
    ///
    /// Entities without an id (not created yet) cannot collide and get no lock.
    pub async fn acquire(&self, resource: Resource, id: Option<u64>) -> Option<EntityLockGuard> {
        let key = EntityKey::new(resource, id?);
        Some(self.acquire_key(key).await)
    }

    /// Take every key in a deterministic order.
    ///
    /// Duplicates are collapsed and keys are taken sorted, so two callers locking overlapping
    /// sets cannot deadlock each other.
    pub async fn acquire_all<I>(&self, keys: I) -> Vec<EntityLockGuard>
    where
        I: IntoIterator<Item = EntityKey>,
    {
        let ordered: BTreeSet<EntityKey> = keys.into_iter().collect();
        let mut guards = Vec::with_capacity(ordered.len());
        for key in ordered {
            guards.push(self.acquire_key(key).await);
        }
        guards
    }

    /// Release a handle; absent handles are ignored
    pub fn release(handle: Option<EntityLockGuard>) {
        if let Some(mut handle) = handle {
            handle.release();
        }
    }

    /// Whether some caller currently holds the entity
    pub fn is_locked(&self, resource: Resource, id: u64) -> bool {
        let key = EntityKey::new(resource, id);
        let registry = self.lock_registry();
        registry
            .get(&key)
            .map(|mutex| mutex.try_lock().is_err())
            .unwrap_or(false)
    }

    /// Number of keys with a holder or a waiter
    pub fn tracked(&self) -> usize {
        self.lock_registry().len()
    }

    async fn acquire_key(&self, key: EntityKey) -> EntityLockGuard {
        let mutex = {
            let mut registry = self.lock_registry();
            registry.entry(key).or_default().clone()
        };

        if mutex.try_lock().is_err() {
            debug!("Waiting for lock on {}", key);
        }
        let guard = mutex.lock_owned().await;
        debug!("Locked {}", key);

        EntityLockGuard {
            key,
            guard: Some(guard),
            registry: self.registry.clone(),
        }
    }

    fn lock_registry(&self) -> MutexGuard<'_, Registry> {
        // The registry map stays consistent even if a holder panicked
        self.registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Held entity lock; released on drop
pub struct EntityLockGuard {
    key: EntityKey,
    guard: Option<OwnedMutexGuard<()>>,
    registry: Arc<Mutex<Registry>>,
}

impl EntityLockGuard {
    pub fn key(&self) -> EntityKey {
        self.key
    }

    /// Release now; later calls and the eventual drop are no-ops
    pub fn release(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        drop(guard);

        let mut registry = self
            .registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Only the registry itself still references the mutex: nobody holds or waits on it
        let idle = registry
            .get(&self.key)
            .map(|mutex| Arc::strong_count(mutex) == 1)
            .unwrap_or(false);
        if idle {
            registry.remove(&self.key);
        }
        debug!("Unlocked {}", self.key);
    }
}

impl Drop for EntityLockGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for EntityLockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityLockGuard")
            .field("key", &self.key)
            .field("held", &self.guard.is_some())
            .finish()
    }
}
