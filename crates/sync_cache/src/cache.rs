//! Per-identity computation lifecycle over an [`ArtifactStore`].
//!
//! Each identity moves `Unbuilt → Building → Available`. At most one
//! computation per identity runs at a time; concurrent callers block until
//! it settles and then either share its result or receive
//! [`SyncError::Abandoned`].
//!
//! Freshly computed paths stay in memory in a small LRU; older ones are
//! demoted to `Persisted` and read back from their artifact on demand.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use contracts::{AlignmentPath, SyncError, SyncIdentity};
use lru::LruCache;
use tracing::{debug, instrument, warn};

use crate::store::ArtifactStore;

/// In-memory paths retained by [`SyncCache::new`]
pub const DEFAULT_MEMORY_ENTRIES: usize = 8;

/// Where an available path can be read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// Produced by this process and still held in memory
    InMemory,
    /// Only on disk
    Persisted,
}

/// Observable lifecycle state of one identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Unbuilt,
    Building,
    Available(Availability),
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Building { generation: u64 },
    Available,
}

#[derive(Debug)]
struct Slots {
    slots: HashMap<SyncIdentity, Slot>,
    /// Paths computed by this process, most recently used first
    memory: LruCache<SyncIdentity, Arc<AlignmentPath>>,
    /// Last failed generation per identity, for waiters of that generation
    failures: HashMap<SyncIdentity, (u64, String)>,
    next_generation: u64,
}

impl Slots {
    fn availability(&self, identity: &SyncIdentity) -> Availability {
        if self.memory.contains(identity) {
            Availability::InMemory
        } else {
            Availability::Persisted
        }
    }
}

/// Content-addressed memo of alignment paths.
pub struct SyncCache {
    store: ArtifactStore,
    slots: Mutex<Slots>,
    settled: Condvar,
}

impl SyncCache {
    pub fn new(store: ArtifactStore) -> Self {
        Self::with_memory_entries(store, DEFAULT_MEMORY_ENTRIES)
    }

    /// Cache keeping at most `entries` paths in memory (minimum 1)
    pub fn with_memory_entries(store: ArtifactStore, entries: usize) -> Self {
        let capacity = NonZeroUsize::new(entries.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            store,
            slots: Mutex::new(Slots {
                slots: HashMap::new(),
                memory: LruCache::new(capacity),
                failures: HashMap::new(),
                next_generation: 0,
            }),
            settled: Condvar::new(),
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        // Slots are only mutated in short, panic-free sections.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state, consulting the artifact directory for unknown identities
    pub fn state(&self, identity: &SyncIdentity) -> CacheState {
        let known = {
            let slots = self.lock();
            match slots.slots.get(identity) {
                Some(Slot::Building { .. }) => Some(CacheState::Building),
                Some(Slot::Available) => Some(CacheState::Available(slots.availability(identity))),
                None => None,
            }
        };
        match known {
            Some(state) => state,
            None if self.store.contains(identity) => {
                CacheState::Available(Availability::Persisted)
            }
            None => CacheState::Unbuilt,
        }
    }

    /// Make sure a path for `identity` is available, running `compute` at
    /// most once across all concurrent callers.
    ///
    /// `compute` runs on the calling thread without holding any lock. Its
    /// result is persisted before the slot becomes available; on failure
    /// nothing is written and the slot returns to `Unbuilt`.
    #[instrument(level = "debug", name = "cache_ensure_computed", skip(self, compute), fields(identity = %identity))]
    pub fn ensure_computed<F>(&self, identity: &SyncIdentity, compute: F) -> Result<(), SyncError>
    where
        F: FnOnce() -> Result<AlignmentPath, SyncError>,
    {
        // Artifact lookup happens with the lock released, then the slot is re-checked
        let mut on_disk = None;
        let generation = loop {
            let mut slots = self.lock();
            match (slots.slots.get(identity).copied(), on_disk) {
                (Some(Slot::Available), _) => {
                    record_hit(slots.availability(identity));
                    return Ok(());
                }
                (Some(Slot::Building { generation }), _) => {
                    debug!(generation, "joining in-flight computation");
                    return self.wait_for(slots, identity, generation);
                }
                (None, None) => {
                    drop(slots);
                    on_disk = Some(self.store.contains(identity));
                }
                (None, Some(true)) => {
                    slots.slots.insert(identity.clone(), Slot::Available);
                    record_hit(Availability::Persisted);
                    return Ok(());
                }
                (None, Some(false)) => {
                    let generation = slots.next_generation;
                    slots.next_generation += 1;
                    slots
                        .slots
                        .insert(identity.clone(), Slot::Building { generation });
                    break generation;
                }
            }
        };

        observability::record_cache_miss();
        let mut guard = BuildGuard {
            cache: self,
            identity,
            generation,
            settled: false,
        };

        let outcome = compute().and_then(|path| {
            self.store.save(identity, &path)?;
            Ok(path)
        });

        match outcome {
            Ok(path) => {
                guard.settle(Ok(Arc::new(path)));
                Ok(())
            }
            Err(err) => {
                warn!(identity = %identity, error = %err, "alignment computation failed");
                guard.settle(Err(err.to_string()));
                Err(err)
            }
        }
    }

    fn wait_for(
        &self,
        slots: MutexGuard<'_, Slots>,
        identity: &SyncIdentity,
        waiting_on: u64,
    ) -> Result<(), SyncError> {
        let slots = self
            .settled
            .wait_while(slots, |s| {
                matches!(
                    s.slots.get(identity),
                    Some(Slot::Building { generation }) if *generation == waiting_on
                )
            })
            .unwrap_or_else(PoisonError::into_inner);

        match slots.slots.get(identity) {
            Some(Slot::Available) => {
                record_hit(slots.availability(identity));
                Ok(())
            }
            _ => {
                let message = match slots.failures.get(identity) {
                    Some((generation, message)) if *generation == waiting_on => message.clone(),
                    _ => "computation failed".to_string(),
                };
                Err(SyncError::Abandoned {
                    identity: identity.clone(),
                    message,
                })
            }
        }
    }

    /// The path for `identity`, preferring the in-memory copy.
    ///
    /// # Errors
    /// [`SyncError::CacheIo`] if nothing was computed and no artifact exists.
    pub fn load_path(&self, identity: &SyncIdentity) -> Result<Arc<AlignmentPath>, SyncError> {
        if let Some(path) = self.lock().memory.get(identity) {
            return Ok(Arc::clone(path));
        }
        self.store.load(identity).map(Arc::new)
    }

    /// Drop the in-memory copy of `identity`; later loads read the artifact.
    pub fn release(&self, identity: &SyncIdentity) {
        self.lock().memory.pop(identity);
    }
}

fn record_hit(availability: Availability) {
    match availability {
        Availability::InMemory => observability::record_cache_hit("memory"),
        Availability::Persisted => observability::record_cache_hit("persisted"),
    }
}

/// Settles a `Building` slot exactly once, including when `compute` panics.
struct BuildGuard<'a> {
    cache: &'a SyncCache,
    identity: &'a SyncIdentity,
    generation: u64,
    settled: bool,
}

impl BuildGuard<'_> {
    fn settle(&mut self, outcome: Result<Arc<AlignmentPath>, String>) {
        self.settled = true;
        let mut slots = self.cache.lock();
        match outcome {
            Ok(path) => {
                slots.failures.remove(self.identity);
                slots.slots.insert(self.identity.clone(), Slot::Available);
                if let Some((demoted, _)) = slots.memory.push(self.identity.clone(), path) {
                    if &demoted != self.identity {
                        debug!(identity = %demoted, "in-memory path demoted to persisted");
                    }
                }
            }
            Err(message) => {
                slots.slots.remove(self.identity);
                slots
                    .failures
                    .insert(self.identity.clone(), (self.generation, message));
            }
        }
        drop(slots);
        self.cache.settled.notify_all();
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.settle(Err("builder panicked".to_string()));
        }
    }
}
