//! Lookup and insert counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Relaxed counters updated on every cache operation
#[derive(Debug, Default)]
pub struct LookupStats {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    registry_fallbacks: AtomicU64,
    inserts: AtomicU64,
    duplicates: AtomicU64,
    skipped: AtomicU64,
}

impl LookupStats {
    pub(crate) fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fallback(&self) {
        self.registry_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    #[must_use]
    pub fn snapshot(&self) -> LookupStatsSnapshot {
        LookupStatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            registry_fallbacks: self.registry_fallbacks.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// Counter values at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupStatsSnapshot {
    /// Lookups answered from the cache
    pub cache_hits: u64,
    /// Lookups with a derivable id that was not cached
    pub cache_misses: u64,
    /// Lookups delegated to the registry
    pub registry_fallbacks: u64,
    /// Records that installed a new mapping
    pub inserts: u64,
    /// Records refused because their id was taken
    pub duplicates: u64,
    /// Records without a derivable id
    pub skipped: u64,
}

impl LookupStatsSnapshot {
    /// Share of id-resolvable lookups answered from the cache
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_ratio(&self) -> Option<f64> {
        let resolvable = self.cache_hits + self.cache_misses;
        (resolvable > 0).then(|| self.cache_hits as f64 / resolvable as f64)
    }
}
