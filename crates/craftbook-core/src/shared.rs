//! Thread-safe handle for hosts that share one store across threads.
//!
//! Writers take the write lock for a single mutation. Each derived query
//! runs entirely under one read guard, so a whole expansion sees one
//! consistent version of the graph and inventory.

use std::sync::Arc;

use craftbook_common::{ResolveResult, StoreResult};
use parking_lot::RwLock;

use crate::craftability::CraftabilityCalculator;
use crate::dependencies::{Dependencies, DependencyResolver};
use crate::expander::{Expander, Expansion};
use crate::graph::ResolveLimits;
use crate::item::{ItemMetadata, RecipeDraft};
use crate::snapshot::StoreSnapshot;
use crate::store::RecipeStore;

/// Cloneable handle to a store guarded by a read-write lock.
#[derive(Debug, Clone, Default)]
pub struct SharedRecipeStore {
    inner: Arc<RwLock<RecipeStore>>,
    limits: ResolveLimits,
}

impl SharedRecipeStore {
    /// Wraps a store with default limits.
    #[must_use]
    pub fn new(store: RecipeStore) -> Self {
        Self::with_limits(store, ResolveLimits::default())
    }

    /// Wraps a store with explicit limits.
    #[must_use]
    pub fn with_limits(store: RecipeStore, limits: ResolveLimits) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
            limits,
        }
    }

    /// Runs `f` against a consistent read view.
    pub fn read<R>(&self, f: impl FnOnce(&RecipeStore) -> R) -> R {
        f(&self.inner.read())
    }

    /// Runs `f` with exclusive access.
    pub fn write<R>(&self, f: impl FnOnce(&mut RecipeStore) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// See [`RecipeStore::upsert_basic`].
    pub fn upsert_basic(&self, name: impl Into<String>, metadata: ItemMetadata) {
        self.write(|store| store.upsert_basic(name, metadata));
    }

    /// See [`RecipeStore::upsert_composite`].
    pub fn upsert_composite(&self, name: impl Into<String>, draft: RecipeDraft) {
        self.write(|store| store.upsert_composite(name, draft));
    }

    /// See [`RecipeStore::delete`].
    pub fn delete(&self, name: &str) -> bool {
        self.write(|store| store.delete(name).is_some())
    }

    /// See [`RecipeStore::set_inventory`].
    pub fn set_inventory(&self, name: impl Into<String>, quantity: i64) {
        self.write(|store| store.set_inventory(name, quantity));
    }

    /// See [`Expander::expand`].
    pub fn expand(&self, name: &str, quantity: u64) -> ResolveResult<Expansion> {
        self.read(|store| Expander::with_limits(store, self.limits).expand(name, quantity))
    }

    /// See [`DependencyResolver::dependencies`].
    pub fn dependencies(&self, name: &str) -> ResolveResult<Dependencies> {
        self.read(|store| DependencyResolver::with_limits(store, self.limits).dependencies(name))
    }

    /// See [`CraftabilityCalculator::max_craftable`].
    pub fn max_craftable(&self, name: &str) -> ResolveResult<u64> {
        self.read(|store| CraftabilityCalculator::with_limits(store, self.limits).max_craftable(name))
    }

    /// Copies the current contents.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        self.read(RecipeStore::to_snapshot)
    }

    /// Replaces the contents; a rejected snapshot changes nothing.
    pub fn load_snapshot(&self, snapshot: StoreSnapshot) -> StoreResult<()> {
        // Validate and build outside the lock so writers are not held up.
        let loaded = snapshot.into_store()?;
        self.write(|store| *store = loaded);
        Ok(())
    }
}
