//! Persistent security registry with a crash-safe write-ahead log

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod memory;
pub mod registry;
pub mod segment;
pub mod wal;
pub mod wal_registry;

pub use memory::InMemorySecurityRegistry;
pub use registry::{SecurityRecord, SecurityRegistry};
pub use wal::{Wal, WalEntry, WalIterator, WalStats};
pub use wal_registry::WalSecurityRegistry;
