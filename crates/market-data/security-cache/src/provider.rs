//! Wide provider surface over a [`SecurityStorage`]
//!
//! Consumers written against the full provider contract expect removed and
//! cleared notifications as well as added. A native-id storage never removes
//! or clears, so [`ProviderAdapter`] accepts those subscriptions and never
//! fires them.

use common::{Security, SecurityRef};
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::debug;

use crate::cache::SecurityStorage;
use crate::error::CacheResult;
use crate::notifier::{SecurityCallback, SubscriptionId};

/// Callback invoked with removed securities
pub type SecuritiesRemovedCallback = Arc<dyn Fn(&[SecurityRef]) + Send + Sync>;

/// Callback invoked when every security is dropped
pub type ClearedCallback = Arc<dyn Fn() + Send + Sync>;

/// Full security provider contract
pub trait SecurityProvider: Send + Sync {
    /// Number of known securities
    fn count(&self) -> usize;

    /// Snapshot of every known security
    fn securities(&self) -> Vec<SecurityRef>;

    /// Resolve criteria to securities
    ///
    /// # Errors
    ///
    /// Propagates lookup failures from the underlying storage.
    fn lookup(&self, criteria: &Security) -> CacheResult<Vec<SecurityRef>>;

    /// Subscribe to added securities
    fn subscribe_added(&self, callback: SecurityCallback) -> SubscriptionId;

    /// Subscribe to removed securities
    fn subscribe_removed(&self, callback: SecuritiesRemovedCallback) -> SubscriptionId;

    /// Subscribe to the provider being cleared
    fn subscribe_cleared(&self, callback: ClearedCallback) -> SubscriptionId;

    /// Drop any subscription; false when unknown
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// Exposes a [`SecurityStorage`] as a [`SecurityProvider`]
pub struct ProviderAdapter<S: SecurityStorage + ?Sized> {
    storage: Arc<S>,
    inert: Mutex<FxHashSet<SubscriptionId>>,
}

impl<S: SecurityStorage + ?Sized> ProviderAdapter<S> {
    /// Wrap a storage
    #[must_use]
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            inert: Mutex::new(FxHashSet::default()),
        }
    }

    /// The wrapped storage
    #[must_use]
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    fn accept_inert(&self, kind: &str) -> SubscriptionId {
        let id = SubscriptionId::allocate();
        self.inert.lock().insert(id);
        debug!(subscription = %id, kind, "Accepted subscription that never fires");
        id
    }
}

impl<S: SecurityStorage + ?Sized> SecurityProvider for ProviderAdapter<S> {
    fn count(&self) -> usize {
        self.storage.count()
    }

    fn securities(&self) -> Vec<SecurityRef> {
        self.storage.securities().collect()
    }

    fn lookup(&self, criteria: &Security) -> CacheResult<Vec<SecurityRef>> {
        self.storage.lookup(criteria)
    }

    fn subscribe_added(&self, callback: SecurityCallback) -> SubscriptionId {
        self.storage.subscribe_added(callback)
    }

    fn subscribe_removed(&self, _callback: SecuritiesRemovedCallback) -> SubscriptionId {
        self.accept_inert("removed")
    }

    fn subscribe_cleared(&self, _callback: ClearedCallback) -> SubscriptionId {
        self.accept_inert("cleared")
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inert.lock().remove(&id) || self.storage.unsubscribe_added(id)
    }
}

impl<S: SecurityStorage + ?Sized> std::fmt::Debug for ProviderAdapter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("inert_subscriptions", &self.inert.lock().len())
            .finish_non_exhaustive()
    }
}
