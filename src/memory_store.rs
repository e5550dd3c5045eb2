use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use async_trait::async_trait;
use futures::lock::Mutex;
use crate::error::StoreError;
use crate::occupancy::OccupancyState;
use crate::store::OccupancyStore;

/// In-memory store implementation for tests and demos.
///
/// Loads and saves can be made to fail on demand to exercise fault handling.
/// Clones share the state and the document lock.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    state: RwLock<OccupancyState>,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
    document: Arc<Mutex<()>>,
}

impl MemoryStore {
    /// Creates a store holding an empty building.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `state`.
    pub fn with_state(state: OccupancyState) -> Self {
        let store = Self::default();
        store.replace(state);
        store
    }

    /// Returns a copy of the stored state.
    pub fn snapshot(&self) -> OccupancyState {
        let guard = self
            .inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    /// Overwrites the stored state without counting a save.
    pub fn replace(&self, state: OccupancyState) {
        let mut guard = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = state;
    }

    /// Makes subsequent loads fail.
    pub fn set_fail_loads(&self, on: bool) {
        self.inner.fail_loads.store(on, Ordering::SeqCst);
    }

    /// Makes subsequent saves fail.
    pub fn set_fail_saves(&self, on: bool) {
        self.inner.fail_saves.store(on, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn saves(&self) -> usize {
        self.inner.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OccupancyStore for MemoryStore {
    async fn load(&self) -> std::result::Result<OccupancyState, StoreError> {
        if self.inner.fail_loads.load(Ordering::SeqCst) {
            return Err("memory store: load failure injected".into());
        }
        Ok(self.snapshot())
    }

    async fn save(&self, state: &OccupancyState) -> std::result::Result<(), StoreError> {
        if self.inner.fail_saves.load(Ordering::SeqCst) {
            return Err("memory store: save failure injected".into());
        }
        self.replace(state.clone());
        self.inner.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn document_lock(&self) -> Option<Arc<Mutex<()>>> {
        Some(Arc::clone(&self.inner.document))
    }
}
