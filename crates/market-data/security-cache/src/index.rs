//! Native-id cache index
//!
//! A concurrent map from an adapter's native identifier to the cached
//! security. Entries are only ever added: the first record to claim an id
//! keeps it for the life of the process.

use common::{Security, SecurityRef, same_security};
use parking_lot::RwLock;
use rustc_hash::{FxBuildHasher, FxHashMap};
use std::collections::hash_map::Entry;
use std::sync::Arc;

use crate::native_id::NativeIdDeriver;

/// Result of offering a security to the index
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    /// The id was free and now maps to the offered security
    Inserted,
    /// The id was already taken; carries the record that holds it
    Duplicate(SecurityRef),
    /// No native id could be derived, nothing changed
    NotIndexable,
}

impl InsertOutcome {
    /// True only for [`InsertOutcome::Inserted`]
    #[must_use]
    pub const fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted)
    }
}

/// Native-id → security map guarded by a single lock
pub struct NativeIdIndex<D: NativeIdDeriver> {
    deriver: D,
    entries: RwLock<FxHashMap<D::Id, SecurityRef>>,
}

impl<D: NativeIdDeriver> NativeIdIndex<D> {
    /// Create an empty index
    #[must_use]
    pub fn new(deriver: D) -> Self {
        Self::with_capacity(deriver, 0)
    }

    /// Create an empty index pre-sized for `capacity` entries
    #[must_use]
    pub fn with_capacity(deriver: D, capacity: usize) -> Self {
        Self {
            deriver,
            entries: RwLock::new(FxHashMap::with_capacity_and_hasher(
                capacity,
                FxBuildHasher,
            )),
        }
    }

    /// The deriver keying this index
    #[must_use]
    pub const fn deriver(&self) -> &D {
        &self.deriver
    }

    /// Derive the native id of a record (or criteria)
    #[must_use]
    pub fn derive(&self, security: &Security) -> Option<D::Id> {
        self.deriver.derive(security)
    }

    /// Bulk-populate from a registry scan; returns how many records were inserted
    ///
    /// Records sharing a native id resolve first-wins in iteration order.
    /// `on_outcome` sees every record with the index lock already released.
    pub fn initialize<I, F>(&self, securities: I, mut on_outcome: F) -> usize
    where
        I: IntoIterator<Item = SecurityRef>,
        F: FnMut(&SecurityRef, InsertOutcome),
    {
        let mut inserted = 0;
        for security in securities {
            let outcome = self.insert(&security);
            if outcome.is_inserted() {
                inserted += 1;
            }
            on_outcome(&security, outcome);
        }
        inserted
    }

    /// Offer a security; true when this call installed the mapping
    ///
    /// Exactly one of any number of concurrent callers racing on the same id
    /// gets `true`. An existing mapping is never overwritten.
    pub fn try_add(&self, security: &SecurityRef) -> bool {
        self.insert(security).is_inserted()
    }

    /// Offer a security and report what happened
    pub fn insert(&self, security: &SecurityRef) -> InsertOutcome {
        // Derivation is pure, so it stays outside the lock
        let Some(id) = self.deriver.derive(security) else {
            return InsertOutcome::NotIndexable;
        };

        match self.entries.write().entry(id) {
            Entry::Occupied(existing) => InsertOutcome::Duplicate(Arc::clone(existing.get())),
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(security));
                InsertOutcome::Inserted
            }
        }
    }

    /// O(1) lookup by native id
    #[must_use]
    pub fn get(&self, id: &D::Id) -> Option<SecurityRef> {
        self.entries.read().get(id).cloned()
    }

    /// Whether an id is cached
    #[must_use]
    pub fn contains(&self, id: &D::Id) -> bool {
        self.entries.read().contains_key(id)
    }

    /// Number of cached entries
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.read().len()
    }

    /// Snapshot of the cached securities in map order
    ///
    /// Later inserts do not show up in an iterator already handed out.
    #[must_use]
    pub fn values(&self) -> std::vec::IntoIter<SecurityRef> {
        let snapshot: Vec<SecurityRef> = self.entries.read().values().cloned().collect();
        snapshot.into_iter()
    }

    /// Native id a security is cached under, by handle identity
    ///
    /// This is a linear scan over every entry and is meant for diagnostic and
    /// administrative callers, not for the hot path.
    #[must_use]
    pub fn reverse_lookup(&self, security: &Security) -> Option<D::Id> {
        self.entries
            .read()
            .iter()
            .find(|(_, cached)| same_security(cached, security))
            .map(|(id, _)| id.clone())
    }
}

impl<D: NativeIdDeriver> std::fmt::Debug for NativeIdIndex<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeIdIndex")
            .field("entries", &self.count())
            .finish_non_exhaustive()
    }
}
