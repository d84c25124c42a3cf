//! Persistent security registry contract

use anyhow::Result;
use common::{Security, SecurityRef, Ts};
use serde::{Deserialize, Serialize};

use crate::wal::WalEntry;

/// Durable store of security records; the system of record for every cache
/// layered on top of it.
///
/// Implementations must be safe to call from many threads at once. Query
/// semantics are implementation-defined; the shipped registries use
/// [`Security::matches`].
pub trait SecurityRegistry: Send + Sync {
    /// Enumerate every stored security
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn all(&self) -> Result<Vec<SecurityRef>>;

    /// Persist a security, replacing any record with the same id
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be made durable.
    fn save(&self, security: &SecurityRef) -> Result<()>;

    /// Generic lookup by partial-match criteria
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be queried.
    fn lookup(&self, criteria: &Security) -> Result<Vec<SecurityRef>>;

    /// List the ids of every stored security
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn security_ids(&self) -> Result<Vec<String>>;
}

/// WAL entry wrapping one saved security
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityRecord {
    /// When the record was saved
    pub ts: Ts,
    /// The saved security
    pub security: Security,
}

impl SecurityRecord {
    /// Stamp a security with the current time
    #[must_use]
    pub fn now(security: Security) -> Self {
        Self {
            ts: Ts::now(),
            security,
        }
    }
}

impl WalEntry for SecurityRecord {
    fn timestamp(&self) -> Ts {
        self.ts
    }
}
