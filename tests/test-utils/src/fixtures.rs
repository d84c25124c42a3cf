//! rstest fixtures shared by the cache test suites

use common::SecurityRef;
use rstest::*;
use std::sync::Arc;
use tempfile::TempDir;

use crate::factories::SecurityFactory;
use crate::mocks::RecordingRegistry;

/// Zerodha-style factory on the NFO board
#[fixture]
pub fn security_factory() -> SecurityFactory {
    SecurityFactory::new()
}

/// Empty recording registry
#[fixture]
pub fn recording_registry() -> Arc<RecordingRegistry> {
    Arc::new(RecordingRegistry::new())
}

/// Ten tokenized records, tokens 1000..1010
#[fixture]
pub fn tokenized_batch(security_factory: SecurityFactory) -> Vec<SecurityRef> {
    security_factory.batch(10, 1000)
}

/// Temporary directory for WAL-backed registries
#[fixture]
pub fn wal_dir() -> TempDir {
    TempDir::new().unwrap_or_else(|e| panic!("failed to create temp dir: {e}"))
}
