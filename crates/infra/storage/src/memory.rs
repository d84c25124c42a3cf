//! In-memory security registry and the table shared with the WAL registry

use anyhow::{Result, anyhow};
use common::{Security, SecurityRef};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::registry::SecurityRegistry;

/// Securities keyed by id, kept in first-save order
#[derive(Debug, Default)]
pub(crate) struct SecurityTable {
    by_id: FxHashMap<String, usize>,
    ordered: Vec<SecurityRef>,
}

impl SecurityTable {
    /// Insert or replace by id; returns true when the id was new
    pub(crate) fn upsert(&mut self, security: SecurityRef) -> bool {
        if let Some(&pos) = self.by_id.get(&security.id) {
            self.ordered[pos] = security;
            false
        } else {
            self.by_id.insert(security.id.clone(), self.ordered.len());
            self.ordered.push(security);
            true
        }
    }

    pub(crate) fn all(&self) -> Vec<SecurityRef> {
        self.ordered.clone()
    }

    pub(crate) fn lookup(&self, criteria: &Security) -> Vec<SecurityRef> {
        // Exact id is the common adapter query; skip the scan for it
        if !criteria.id.is_empty() {
            if let Some(&pos) = self.by_id.get(&criteria.id) {
                let security = &self.ordered[pos];
                return if security.matches(criteria) {
                    vec![Arc::clone(security)]
                } else {
                    Vec::new()
                };
            }
        }

        self.ordered
            .iter()
            .filter(|s| s.matches(criteria))
            .cloned()
            .collect()
    }

    pub(crate) fn ids(&self) -> Vec<String> {
        self.ordered.iter().map(|s| s.id.clone()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.ordered.len()
    }
}

/// Volatile registry for tests, simulations and adapters without persistence
#[derive(Debug, Default)]
pub struct InMemorySecurityRegistry {
    table: RwLock<SecurityTable>,
}

impl InMemorySecurityRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with securities
    ///
    /// # Errors
    ///
    /// Returns an error if any security has an empty id.
    pub fn with_securities(securities: impl IntoIterator<Item = SecurityRef>) -> Result<Self> {
        let registry = Self::new();
        for security in securities {
            registry.save(&security)?;
        }
        Ok(registry)
    }

    /// Number of stored securities
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SecurityRegistry for InMemorySecurityRegistry {
    fn all(&self) -> Result<Vec<SecurityRef>> {
        Ok(self.table.read().all())
    }

    fn save(&self, security: &SecurityRef) -> Result<()> {
        if !security.has_id() {
            return Err(anyhow!("Cannot save a security without an id"));
        }
        self.table.write().upsert(Arc::clone(security));
        Ok(())
    }

    fn lookup(&self, criteria: &Security) -> Result<Vec<SecurityRef>> {
        Ok(self.table.read().lookup(criteria))
    }

    fn security_ids(&self) -> Result<Vec<String>> {
        Ok(self.table.read().ids())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::SecurityType;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn registry() -> InMemorySecurityRegistry {
        InMemorySecurityRegistry::with_securities([
            Arc::new(Security::new("SBER", "TQBR").with_type(SecurityType::Stock)),
            Arc::new(Security::new("GAZP", "TQBR").with_type(SecurityType::Stock)),
            Arc::new(Security::new("SiZ4", "FORTS").with_type(SecurityType::Future)),
        ])
        .unwrap_or_default()
    }

    #[rstest]
    fn test_lookup_by_board(registry: InMemorySecurityRegistry) -> Result<()> {
        let found = registry.lookup(&Security {
            board: "tqbr".into(),
            ..Security::default()
        })?;
        let ids: Vec<_> = found.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["SBER@TQBR", "GAZP@TQBR"]);
        Ok(())
    }

    #[rstest]
    fn test_lookup_by_exact_id(registry: InMemorySecurityRegistry) -> Result<()> {
        let found = registry.lookup(&Security {
            id: "SiZ4@FORTS".into(),
            ..Security::default()
        })?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].security_type, Some(SecurityType::Future));

        let none = registry.lookup(&Security {
            id: "SiZ4@FORTS".into(),
            security_type: Some(SecurityType::Stock),
            ..Security::default()
        })?;
        assert!(none.is_empty());
        Ok(())
    }

    #[rstest]
    fn test_save_replaces_same_id(registry: InMemorySecurityRegistry) -> Result<()> {
        let renamed = Arc::new(Security::new("SBER", "TQBR").with_name("Sberbank"));
        registry.save(&renamed)?;

        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.security_ids()?,
            vec!["SBER@TQBR", "GAZP@TQBR", "SiZ4@FORTS"]
        );
        let all = registry.all()?;
        assert!(Arc::ptr_eq(&all[0], &renamed));
        Ok(())
    }

    #[test]
    fn test_save_rejects_missing_id() {
        let registry = InMemorySecurityRegistry::new();
        assert!(registry.save(&Arc::new(Security::criteria())).is_err());
        assert!(registry.is_empty());
    }
}
