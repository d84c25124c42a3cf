//! Native-id keyed security cache
//!
//! Trading adapters identify instruments by their own keys (exchange tokens,
//! venue symbols). This crate keeps one in-memory index per adapter, keyed by
//! that native identifier, in front of the persistent security registry:
//!
//! - [`NativeIdIndex`] maps native ids to cached records, first writer wins
//! - [`NativeIdStorage`] hydrates the index, persists saves, answers lookups
//! - [`ChangeNotifier`] fans "added" events out to subscribers
//! - [`ProviderAdapter`] exposes a storage through the wider provider contract

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod config;
pub mod error;
pub mod index;
pub mod metrics;
pub mod native_id;
pub mod notifier;
pub mod provider;

pub use crate::cache::{NativeIdStorage, NativeIdStorageBuilder, SecurityStorage};
pub use crate::config::{RegistryConfig, SecurityCacheConfig};
pub use crate::error::{CacheError, CacheResult};
pub use crate::index::{InsertOutcome, NativeIdIndex};
pub use crate::metrics::{LookupStats, LookupStatsSnapshot};
pub use crate::native_id::{ExtensionKeyDeriver, FnDeriver, FromExtensionValue, NativeId, NativeIdDeriver};
pub use crate::notifier::{ChangeNotifier, SecurityCallback, SubscriptionId};
pub use crate::provider::{ClearedCallback, ProviderAdapter, SecuritiesRemovedCallback, SecurityProvider};
