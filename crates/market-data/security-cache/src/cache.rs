//! Native-id security storage
//!
//! [`NativeIdStorage`] puts a [`NativeIdIndex`] in front of a
//! [`SecurityRegistry`]. The registry stays the system of record: saves are
//! persisted before they become visible in the cache, and criteria that carry
//! no derivable native id are answered by the registry. Criteria that do carry
//! one are answered from the cache alone.

use common::{Security, SecurityRef};
use std::sync::Arc;
use std::time::Instant;
use storage::SecurityRegistry;
use tracing::{debug, info, trace, warn};

use crate::config::SecurityCacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::index::{InsertOutcome, NativeIdIndex};
use crate::metrics::{LookupStats, LookupStatsSnapshot};
use crate::native_id::NativeIdDeriver;
use crate::notifier::{ChangeNotifier, SecurityCallback, SubscriptionId};

/// What a security storage can actually do
///
/// The only change signal is "added": this layer never removes or clears.
pub trait SecurityStorage: Send + Sync {
    /// Snapshot of every cached security
    fn securities(&self) -> std::vec::IntoIter<SecurityRef>;

    /// Number of cached securities
    fn count(&self) -> usize;

    /// Resolve criteria to securities
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Registry`] when the registry path fails.
    fn lookup(&self, criteria: &Security) -> CacheResult<Vec<SecurityRef>>;

    /// Persist a security, then offer it to the cache
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidArgument`] for a record without an id and
    /// [`CacheError::Registry`] when persisting fails.
    fn save(&self, security: SecurityRef) -> CacheResult<()>;

    /// Always fails with [`CacheError::Unsupported`]
    ///
    /// # Errors
    ///
    /// Always.
    fn delete(&self, security: &Security) -> CacheResult<()>;

    /// Always fails with [`CacheError::Unsupported`]
    ///
    /// # Errors
    ///
    /// Always.
    fn delete_by_criteria(&self, criteria: &Security) -> CacheResult<()>;

    /// Ids of every security in the registry
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Registry`] when the registry fails.
    fn security_ids(&self) -> CacheResult<Vec<String>>;

    /// Subscribe to newly cached securities
    fn subscribe_added(&self, callback: SecurityCallback) -> SubscriptionId;

    /// Drop an "added" subscription; false when unknown
    fn unsubscribe_added(&self, id: SubscriptionId) -> bool;
}

/// Security storage keyed by one adapter's native identifier
pub struct NativeIdStorage<D: NativeIdDeriver> {
    registry: Arc<dyn SecurityRegistry>,
    index: NativeIdIndex<D>,
    added: ChangeNotifier,
    stats: LookupStats,
}

impl<D: NativeIdDeriver> NativeIdStorage<D> {
    /// Start building a storage around `deriver`
    #[must_use]
    pub fn builder(deriver: D) -> NativeIdStorageBuilder<D> {
        NativeIdStorageBuilder::new(deriver)
    }

    /// Build with default configuration and hydrate from `registry`
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Registry`] if the registry cannot be enumerated.
    pub fn new(registry: Arc<dyn SecurityRegistry>, deriver: D) -> CacheResult<Self> {
        Self::builder(deriver).registry(registry).build()
    }

    /// Offer a security to the cache without persisting it
    ///
    /// Returns true when this call installed the mapping; the "added"
    /// subscribers have run by the time it returns.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidArgument`] for a record without an id.
    pub fn try_add(&self, security: &SecurityRef) -> CacheResult<bool> {
        ensure_has_id(security)?;
        Ok(self.offer(security, true))
    }

    /// O(1) lookup by native id
    #[must_use]
    pub fn get(&self, id: &D::Id) -> Option<SecurityRef> {
        self.index.get(id)
    }

    /// Native id a cached security is stored under
    ///
    /// Scans every entry comparing handles; intended for diagnostics.
    #[must_use]
    pub fn get_native_id(&self, security: &Security) -> Option<D::Id> {
        self.index.reverse_lookup(security)
    }

    /// Subscribe a closure to newly cached securities
    pub fn on_added<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&SecurityRef) + Send + Sync + 'static,
    {
        self.added.subscribe(Arc::new(callback))
    }

    /// Lookup and insert counters
    #[must_use]
    pub fn stats(&self) -> LookupStatsSnapshot {
        self.stats.snapshot()
    }

    /// The deriver keying this storage
    #[must_use]
    pub const fn deriver(&self) -> &D {
        self.index.deriver()
    }

    fn hydrate(&self, notify: bool) -> CacheResult<usize> {
        let start = Instant::now();
        let securities = self.registry.all().map_err(CacheError::Registry)?;
        let total = securities.len();

        let with_id = securities.into_iter().filter(|security| {
            let has_id = security.has_id();
            if !has_id {
                warn!("Skipping registry record without a security id");
            }
            has_id
        });
        let inserted = self.index.initialize(with_id, |security, outcome| {
            self.settle(security, outcome, notify);
        });

        info!(
            registry = total,
            cached = inserted,
            notified = notify,
            elapsed = ?start.elapsed(),
            "Hydrated native-id cache"
        );
        Ok(inserted)
    }

    /// Insert under the index lock, then notify with the lock released
    fn offer(&self, security: &SecurityRef, notify: bool) -> bool {
        self.settle(security, self.index.insert(security), notify)
    }

    /// Record stats and notify for an insert that has already happened
    fn settle(&self, security: &SecurityRef, outcome: InsertOutcome, notify: bool) -> bool {
        match outcome {
            InsertOutcome::Inserted => {
                self.stats.record_insert();
                debug!(security_id = %security.id, "Cached security");
                if notify {
                    self.added.notify(security);
                }
                true
            }
            InsertOutcome::Duplicate(holder) => {
                self.stats.record_duplicate();
                debug!(
                    security_id = %security.id,
                    cached_as = %holder.id,
                    "Native id already cached"
                );
                false
            }
            InsertOutcome::NotIndexable => {
                self.stats.record_skipped();
                trace!(security_id = %security.id, "No native id, not cached");
                false
            }
        }
    }
}

impl<D: NativeIdDeriver> SecurityStorage for NativeIdStorage<D> {
    fn securities(&self) -> std::vec::IntoIter<SecurityRef> {
        self.index.values()
    }

    fn count(&self) -> usize {
        self.index.count()
    }

    fn lookup(&self, criteria: &Security) -> CacheResult<Vec<SecurityRef>> {
        let native_id = criteria
            .extension_info
            .as_ref()
            .and_then(|_| self.index.derive(criteria));

        let Some(id) = native_id else {
            self.stats.record_fallback();
            trace!("No native id in criteria, delegating to registry");
            return self.registry.lookup(criteria).map_err(CacheError::Registry);
        };

        // A derivable id is answered by the cache alone; a miss is "not present"
        if let Some(security) = self.index.get(&id) {
            self.stats.record_hit();
            Ok(vec![security])
        } else {
            self.stats.record_miss();
            trace!(native_id = ?id, "Native id not cached");
            Ok(Vec::new())
        }
    }

    fn save(&self, security: SecurityRef) -> CacheResult<()> {
        ensure_has_id(&security)?;
        self.registry
            .save(&security)
            .map_err(CacheError::Registry)?;
        self.offer(&security, true);
        Ok(())
    }

    fn delete(&self, security: &Security) -> CacheResult<()> {
        warn!(security_id = %security.id, "Rejected delete on native-id storage");
        Err(CacheError::Unsupported(
            "native-id storage does not delete securities".to_string(),
        ))
    }

    fn delete_by_criteria(&self, _criteria: &Security) -> CacheResult<()> {
        warn!("Rejected delete by criteria on native-id storage");
        Err(CacheError::Unsupported(
            "native-id storage does not delete securities by criteria".to_string(),
        ))
    }

    fn security_ids(&self) -> CacheResult<Vec<String>> {
        self.registry.security_ids().map_err(CacheError::Registry)
    }

    fn subscribe_added(&self, callback: SecurityCallback) -> SubscriptionId {
        self.added.subscribe(callback)
    }

    fn unsubscribe_added(&self, id: SubscriptionId) -> bool {
        self.added.unsubscribe(id)
    }
}

impl<D: NativeIdDeriver> std::fmt::Debug for NativeIdStorage<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeIdStorage")
            .field("index", &self.index)
            .field("added", &self.added)
            .finish_non_exhaustive()
    }
}

/// Builder for [`NativeIdStorage`]
///
/// Subscribers registered with [`NativeIdStorageBuilder::on_added`] are in
/// place before hydration, so they see the startup replay when
/// [`SecurityCacheConfig::notify_on_hydration`] is set.
pub struct NativeIdStorageBuilder<D: NativeIdDeriver> {
    deriver: D,
    registry: Option<Arc<dyn SecurityRegistry>>,
    config: SecurityCacheConfig,
    on_added: Vec<SecurityCallback>,
}

impl<D: NativeIdDeriver> NativeIdStorageBuilder<D> {
    fn new(deriver: D) -> Self {
        Self {
            deriver,
            registry: None,
            config: SecurityCacheConfig::default(),
            on_added: Vec::new(),
        }
    }

    /// Set the persistent registry (required)
    #[must_use]
    pub fn registry(mut self, registry: Arc<dyn SecurityRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replace the configuration
    #[must_use]
    pub fn config(mut self, config: SecurityCacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Toggle "added" notifications during startup hydration
    #[must_use]
    pub const fn notify_on_hydration(mut self, notify: bool) -> Self {
        self.config.notify_on_hydration = notify;
        self
    }

    /// Subscribe before hydration
    #[must_use]
    pub fn on_added<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SecurityRef) + Send + Sync + 'static,
    {
        self.on_added.push(Arc::new(callback));
        self
    }

    /// Create the storage and hydrate it from the registry
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidArgument`] when no registry was given (no
    /// hydration is attempted) and [`CacheError::Registry`] when enumerating
    /// the registry fails.
    pub fn build(self) -> CacheResult<NativeIdStorage<D>> {
        let registry = self.registry.ok_or_else(|| {
            CacheError::InvalidArgument("a security registry is required".to_string())
        })?;

        let storage = NativeIdStorage {
            registry,
            index: NativeIdIndex::with_capacity(self.deriver, self.config.initial_capacity),
            added: ChangeNotifier::new(),
            stats: LookupStats::default(),
        };

        for callback in self.on_added {
            storage.added.subscribe(callback);
        }

        storage.hydrate(self.config.notify_on_hydration)?;
        Ok(storage)
    }
}

fn ensure_has_id(security: &Security) -> CacheResult<()> {
    if security.has_id() {
        Ok(())
    } else {
        Err(CacheError::InvalidArgument(
            "security record has no id".to_string(),
        ))
    }
}
