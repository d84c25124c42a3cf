//! WAL-backed security registry
//!
//! Every save is appended to the WAL and synced before the in-memory view
//! changes. Opening replays the WAL in order; a later record for the same id
//! replaces the earlier one.

use anyhow::{Context, Result, anyhow};
use common::{Security, SecurityRef};
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::memory::SecurityTable;
use crate::registry::{SecurityRecord, SecurityRegistry};
use crate::wal::{BYTES_PER_MB, Wal, WalStats};

/// Progress log interval while replaying
const REPLAY_PROGRESS_INTERVAL: usize = 10_000;

/// Durable registry persisting securities to a segmented WAL
pub struct WalSecurityRegistry {
    wal: Mutex<Wal>,
    table: RwLock<SecurityTable>,
}

impl WalSecurityRegistry {
    /// Open the registry in `dir`, replaying any existing segments
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be used or a segment is corrupt.
    pub fn open(dir: &Path, segment_size_mb: Option<u64>) -> Result<Self> {
        let wal = Wal::new(dir, segment_size_mb.map(|mb| mb * BYTES_PER_MB))
            .context("Failed to initialize security WAL")?;

        info!("Loading securities from WAL...");
        let start = Instant::now();
        let mut table = SecurityTable::default();
        let mut replayed = 0_usize;

        let mut iter = wal.stream::<SecurityRecord>(None)?;
        while let Some(record) = iter.read_next_entry()? {
            table.upsert(Arc::new(record.security));
            replayed += 1;

            if replayed % REPLAY_PROGRESS_INTERVAL == 0 {
                debug!("Replayed {} security records", replayed);
            }
        }

        info!(
            records = replayed,
            securities = table.len(),
            elapsed = ?start.elapsed(),
            "Loaded securities from WAL"
        );

        Ok(Self {
            wal: Mutex::new(wal),
            table: RwLock::new(table),
        })
    }

    /// Number of distinct securities
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// WAL statistics
    ///
    /// # Errors
    ///
    /// Returns an error if segment metadata cannot be read.
    pub fn stats(&self) -> Result<WalStats> {
        self.wal.lock().stats()
    }
}

impl SecurityRegistry for WalSecurityRegistry {
    fn all(&self) -> Result<Vec<SecurityRef>> {
        Ok(self.table.read().all())
    }

    fn save(&self, security: &SecurityRef) -> Result<()> {
        if !security.has_id() {
            return Err(anyhow!("Cannot save a security without an id"));
        }

        // Holding the WAL lock across the view update keeps both in append order
        let mut wal = self.wal.lock();
        wal.append(&SecurityRecord::now(Security::clone(security)))
            .with_context(|| format!("Failed to write security {} to WAL", security.id))?;
        wal.flush().context("Failed to sync security WAL")?;

        let inserted = self.table.write().upsert(Arc::clone(security));
        debug!(security_id = %security.id, inserted, "Saved security");
        Ok(())
    }

    fn lookup(&self, criteria: &Security) -> Result<Vec<SecurityRef>> {
        Ok(self.table.read().lookup(criteria))
    }

    fn security_ids(&self) -> Result<Vec<String>> {
        Ok(self.table.read().ids())
    }
}
