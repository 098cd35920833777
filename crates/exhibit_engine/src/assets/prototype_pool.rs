//! Bounded prototype cache
//!
//! Keeps at most `capacity` loaded prototypes resident, evicting the least
//! recently used one when a new prototype pushes the pool over capacity.
//!
//! All bookkeeping happens under a single mutex; loads run outside it so a
//! slow loader never blocks hits on other ids. Concurrent misses on the same
//! id wait for the load already in flight instead of starting another one.
//!
//! ```ignore
//! let pool = PrototypePool::new(RonModelLoader::new(["assets"]), 2);
//! let instance = pool.instance(&AssetId::from("hull"));
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::assets::memory_pressure::Evictable;
use crate::assets::{AssetId, PrototypeLoader};

struct PoolState<P> {
    prototypes: HashMap<AssetId, Arc<P>>,
    /// Least recently used first
    recency: VecDeque<AssetId>,
    in_flight: HashSet<AssetId>,
    /// Bumped by every `evict_all`; loads that started before it are not cached
    generation: u64,
}

impl<P> PoolState<P> {
    fn new() -> Self {
        Self {
            prototypes: HashMap::new(),
            recency: VecDeque::new(),
            in_flight: HashSet::new(),
            generation: 0,
        }
    }

    fn touch(&mut self, id: &AssetId) {
        if let Some(index) = self.recency.iter().position(|entry| entry == id) {
            self.recency.remove(index);
        }
        self.recency.push_back(id.clone());
    }

    fn insert(&mut self, id: AssetId, prototype: Arc<P>, capacity: usize) {
        self.touch(&id);
        self.prototypes.insert(id, prototype);
        while self.prototypes.len() > capacity {
            let Some(oldest) = self.recency.pop_front() else {
                break;
            };
            self.prototypes.remove(&oldest);
            log::debug!("Evicted prototype '{}'", oldest);
        }
    }
}

/// Capacity-bounded LRU cache of loaded prototypes
pub struct PrototypePool<L: PrototypeLoader> {
    loader: L,
    capacity: usize,
    state: Mutex<PoolState<L::Prototype>>,
    load_finished: Condvar,
}

impl<L: PrototypeLoader> PrototypePool<L> {
    /// Create an empty pool holding at most `capacity` prototypes
    pub fn new(loader: L, capacity: usize) -> Self {
        if capacity == 0 {
            log::warn!("Prototype pool capacity 0 raised to 1");
        }
        Self {
            loader,
            capacity: capacity.max(1),
            state: Mutex::new(PoolState::new()),
            load_finished: Condvar::new(),
        }
    }

    /// Maximum number of resident prototypes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The loader backing this pool
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Cached prototype for `id`, loading it on a miss
    ///
    /// A hit marks the id most recently used. A failed load is logged, not
    /// cached, and reported as `None`.
    pub fn get(&self, id: &AssetId) -> Option<Arc<L::Prototype>> {
        let mut state = self.lock();
        loop {
            if let Some(prototype) = state.prototypes.get(id).cloned() {
                state.touch(id);
                log::trace!("Prototype cache hit for '{}'", id);
                return Some(prototype);
            }
            if !state.in_flight.contains(id) {
                break;
            }
            state = self
                .load_finished
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        state.in_flight.insert(id.clone());
        let generation = state.generation;
        drop(state);

        let _in_flight = InFlight { pool: self, id };
        log::debug!("Prototype cache miss for '{}', loading", id);

        match self.loader.load_prototype(id) {
            Ok(prototype) => {
                let prototype = Arc::new(prototype);
                let mut state = self.lock();
                if state.generation == generation {
                    state.insert(id.clone(), Arc::clone(&prototype), self.capacity);
                } else {
                    log::debug!("Pool was flushed while '{}' loaded, not caching it", id);
                }
                Some(prototype)
            }
            Err(e) => {
                log::warn!("Failed to load prototype '{}': {}", id, e);
                None
            }
        }
    }

    /// Independent copy of a prototype, safe to hand to one owner
    pub fn clone_prototype(&self, prototype: &L::Prototype) -> L::Prototype {
        prototype.clone()
    }

    /// Load (or reuse) a prototype and return an independent copy of it
    pub fn instance(&self, id: &AssetId) -> Option<L::Prototype> {
        self.get(id).map(|prototype| self.clone_prototype(&prototype))
    }

    /// Warm the pool with every id in `ids`
    ///
    /// Duplicates are loaded once, in order of first occurrence. Returns the
    /// number of distinct ids that loaded successfully.
    pub fn preload<I>(&self, ids: I) -> usize
    where
        I: IntoIterator,
        I::Item: Into<AssetId>,
    {
        let mut seen = HashSet::new();
        let mut loaded = 0;
        for id in ids.into_iter().map(Into::into) {
            if !seen.insert(id.clone()) {
                continue;
            }
            if self.get(&id).is_some() {
                loaded += 1;
            }
        }
        log::info!("Preloaded {} of {} prototypes", loaded, seen.len());
        loaded
    }

    /// Drop every resident prototype
    ///
    /// Instances already handed out are unaffected. Loads in flight complete
    /// for their callers but are not cached.
    pub fn evict_all(&self) {
        let mut state = self.lock();
        let count = state.prototypes.len();
        state.prototypes.clear();
        state.recency.clear();
        state.generation += 1;
        log::info!("Evicted all {} prototypes", count);
    }

    /// Resident ids, least recently used first
    pub fn resident_ids(&self) -> Vec<AssetId> {
        self.lock().recency.iter().cloned().collect()
    }

    /// Whether `id` is resident (does not touch recency)
    pub fn contains(&self, id: &AssetId) -> bool {
        self.lock().prototypes.contains_key(id)
    }

    /// Number of resident prototypes
    pub fn len(&self) -> usize {
        self.lock().prototypes.len()
    }

    /// Whether no prototype is resident
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, PoolState<L::Prototype>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<L: PrototypeLoader> Evictable for PrototypePool<L> {
    fn evict_all(&self) {
        PrototypePool::evict_all(self);
    }
}

/// Clears the in-flight mark and wakes waiters, even if the loader panics
struct InFlight<'a, L: PrototypeLoader> {
    pool: &'a PrototypePool<L>,
    id: &'a AssetId,
}

impl<L: PrototypeLoader> Drop for InFlight<'_, L> {
    fn drop(&mut self) {
        self.pool.lock().in_flight.remove(self.id);
        self.pool.load_finished.notify_all();
    }
}
