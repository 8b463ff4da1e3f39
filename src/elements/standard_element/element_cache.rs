//! Build-once storage for reference data.
//!
//! [`StandardElementCache`] is owned by whoever processes a mesh and handed to
//! [`StandardElement::from_cache`](super::standard_element::StandardElement::from_cache).
//! Every key maps to its own `OnceCell`: the first requester builds the table while
//! concurrent requesters of the same key block on that cell and then share the result.
//! The map lock is only held to look up or insert the cell, never during a build, so
//! different keys build in parallel. A failed build removes its cell again, so a later
//! request retries from scratch.

use crate::elements::standard_element::reference_basis_table::{ReferenceBasisTable, StandardElementKey};
use crate::error::Result;
use log::debug;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Map whose values are built at most once per key.
#[derive(Debug)]
pub(crate) struct BuildOnceMap<K, V> {
    slots: Mutex<HashMap<K, Arc<OnceCell<Arc<V>>>>>,
}

impl<K, V> Default for BuildOnceMap<K, V> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Copy, V> BuildOnceMap<K, V> {
    fn lock(&self) -> MutexGuard<'_, HashMap<K, Arc<OnceCell<Arc<V>>>>> {
        // a panicking builder never holds this lock, the map stays consistent
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, key: K) -> Arc<OnceCell<Arc<V>>> {
        Arc::clone(self.lock().entry(key).or_default())
    }

    pub(crate) fn get(&self, key: &K) -> Option<Arc<V>> {
        self.lock().get(key).and_then(|slot| slot.get().cloned())
    }

    /// Returns the value for `key`, running `build` if no value exists yet.
    ///
    /// The boolean is true when this call performed the build.
    pub(crate) fn get_or_try_build(&self, key: K, build: impl FnOnce() -> Result<V>) -> Result<(Arc<V>, bool)> {
        let slot = self.slot(key);
        let mut built = false;
        let value = slot
            .get_or_try_init(|| {
                built = true;
                build().map(Arc::new)
            })
            .inspect_err(|_| self.discard_empty(key, &slot))?;
        Ok((Arc::clone(value), built))
    }

    /// Drops the cell of `key` if it is still `slot` and still empty.
    fn discard_empty(&self, key: K, slot: &Arc<OnceCell<Arc<V>>>) {
        let mut slots = self.lock();
        if slots
            .get(&key)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && current.get().is_none())
        {
            slots.remove(&key);
        }
    }

    /// Number of keys holding a built value.
    pub(crate) fn len(&self) -> usize {
        self.lock().values().filter(|slot| slot.get().is_some()).count()
    }

    /// Number of cells, built or in progress.
    #[cfg(test)]
    fn n_slots(&self) -> usize {
        self.lock().len()
    }
}

/// Reference basis tables shared between standard elements, one per key.
#[derive(Debug, Default)]
pub struct StandardElementCache {
    tables: BuildOnceMap<StandardElementKey, ReferenceBasisTable>,
}

impl StandardElementCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table for `key`, built on first request.
    pub fn get_or_build(&self, key: StandardElementKey) -> Result<Arc<ReferenceBasisTable>> {
        let (table, built) = self
            .tables
            .get_or_try_build(key, || ReferenceBasisTable::build(key))?;
        if !built {
            debug!(
                "reference basis table for {} (degree {}, order {}) fetched from cache",
                key.kind, key.degree, key.order_exact
            );
        }
        Ok(table)
    }

    pub fn get(&self, key: &StandardElementKey) -> Option<Arc<ReferenceBasisTable>> {
        self.tables.get(key)
    }

    pub fn contains(&self, key: &StandardElementKey) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
