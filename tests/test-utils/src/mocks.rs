//! Registry test doubles

use anyhow::{Result, bail};
use common::{Security, SecurityRef};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use storage::{InMemorySecurityRegistry, SecurityRegistry};

/// Per-method call counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryCalls {
    pub all: usize,
    pub save: usize,
    pub lookup: usize,
    pub security_ids: usize,
}

/// In-memory registry that records every call made to it
///
/// Lets tests tell whether a lookup was answered by the cache or reached the
/// registry, and inject failures.
#[derive(Debug, Default)]
pub struct RecordingRegistry {
    inner: InMemorySecurityRegistry,
    all: AtomicUsize,
    save: AtomicUsize,
    lookup: AtomicUsize,
    security_ids: AtomicUsize,
    fail_next_save: AtomicBool,
    fail_all: AtomicBool,
    lookups: Mutex<Vec<Security>>,
}

impl RecordingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated without counting the seeding saves
    pub fn with_securities(securities: impl IntoIterator<Item = SecurityRef>) -> Result<Self> {
        Ok(Self {
            inner: InMemorySecurityRegistry::with_securities(securities)?,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> RegistryCalls {
        RegistryCalls {
            all: self.all.load(Ordering::SeqCst),
            save: self.save.load(Ordering::SeqCst),
            lookup: self.lookup.load(Ordering::SeqCst),
            security_ids: self.security_ids.load(Ordering::SeqCst),
        }
    }

    /// Criteria passed to `lookup`, in call order
    pub fn lookups(&self) -> Vec<Security> {
        self.lookups.lock().clone()
    }

    /// Number of persisted records
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Make the next `save` fail without persisting
    pub fn fail_next_save(&self) {
        self.fail_next_save.store(true, Ordering::SeqCst);
    }

    /// Make every call fail
    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            bail!("registry unavailable");
        }
        Ok(())
    }
}

impl SecurityRegistry for RecordingRegistry {
    fn all(&self) -> Result<Vec<SecurityRef>> {
        self.all.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.inner.all()
    }

    fn save(&self, security: &SecurityRef) -> Result<()> {
        self.save.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        if self.fail_next_save.swap(false, Ordering::SeqCst) {
            bail!("save of {} failed", security.id);
        }
        self.inner.save(security)
    }

    fn lookup(&self, criteria: &Security) -> Result<Vec<SecurityRef>> {
        self.lookup.fetch_add(1, Ordering::SeqCst);
        self.lookups.lock().push(criteria.clone());
        self.check_available()?;
        self.inner.lookup(criteria)
    }

    fn security_ids(&self) -> Result<Vec<String>> {
        self.security_ids.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.inner.security_ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factories::SecurityFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_counts_and_failures() -> Result<()> {
        let factory = SecurityFactory::new();
        let registry = RecordingRegistry::with_securities(factory.batch(2, 1))?;
        assert_eq!(registry.calls(), RegistryCalls::default());

        registry.fail_next_save();
        assert!(registry.save(&factory.tokenized("X", 9)).is_err());
        registry.save(&factory.tokenized("Y", 10))?;
        registry.lookup(&Security::criteria())?;

        assert_eq!(
            registry.calls(),
            RegistryCalls {
                all: 0,
                save: 2,
                lookup: 1,
                security_ids: 0,
            }
        );
        assert_eq!(registry.len(), 3);

        registry.fail_all(true);
        assert!(registry.all().is_err());
        Ok(())
    }
}
