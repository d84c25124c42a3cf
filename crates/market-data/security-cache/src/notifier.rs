//! "Added" change notification
//!
//! Subscribers run synchronously on the thread that inserted the record, after
//! the insert is visible and with no cache lock held, so a subscriber may read
//! from or save into the same cache.

use common::SecurityRef;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Callback invoked with a newly cached security
pub type SecurityCallback = Arc<dyn Fn(&SecurityRef) + Send + Sync>;

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// Handle returned by a subscription, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Allocate a process-unique id
    #[must_use]
    pub fn allocate() -> Self {
        Self(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SUB_{}", self.0)
    }
}

/// Subscriber list for the "added" signal
#[derive(Default)]
pub struct ChangeNotifier {
    subscribers: RwLock<Vec<(SubscriptionId, SecurityCallback)>>,
}

impl ChangeNotifier {
    /// Create a notifier with no subscribers
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback
    pub fn subscribe(&self, callback: SecurityCallback) -> SubscriptionId {
        let id = SubscriptionId::allocate();
        self.subscribers.write().push((id, callback));
        trace!(subscription = %id, "Added subscriber");
        id
    }

    /// Remove a callback; false when the id is unknown
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(sub, _)| *sub != id);
        before != subscribers.len()
    }

    /// Number of current subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Invoke every current subscriber once with `security`
    pub fn notify(&self, security: &SecurityRef) {
        // Snapshot so callbacks can (un)subscribe without deadlocking
        let callbacks: Vec<SecurityCallback> = self
            .subscribers
            .read()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(security);
        }
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Security;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, SecurityCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let callback: SecurityCallback = Arc::new(move |_: &SecurityRef| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (count, callback)
    }

    #[test]
    fn test_notify_reaches_every_subscriber() {
        let notifier = ChangeNotifier::new();
        let (first, first_cb) = counter();
        let (second, second_cb) = counter();
        notifier.subscribe(first_cb);
        notifier.subscribe(second_cb);

        notifier.notify(&Arc::new(Security::new("SBER", "TQBR")));

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let notifier = ChangeNotifier::new();
        let (count, callback) = counter();
        let id = notifier.subscribe(callback);

        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        assert_eq!(notifier.subscriber_count(), 0);

        notifier.notify(&Arc::new(Security::new("SBER", "TQBR")));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_callback_may_unsubscribe_itself() {
        let notifier = Arc::new(ChangeNotifier::new());
        let slot: Arc<parking_lot::Mutex<Option<SubscriptionId>>> = Arc::default();

        let inner = Arc::clone(&notifier);
        let own_id = Arc::clone(&slot);
        let id = notifier.subscribe(Arc::new(move |_: &SecurityRef| {
            if let Some(id) = own_id.lock().take() {
                inner.unsubscribe(id);
            }
        }));
        *slot.lock() = Some(id);

        notifier.notify(&Arc::new(Security::new("SBER", "TQBR")));
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn test_subscription_ids_are_unique() {
        let a = SubscriptionId::allocate();
        let b = SubscriptionId::allocate();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("SUB_"));
    }
}
