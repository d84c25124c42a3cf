//! Native identifiers and the strategies that derive them
//!
//! Each adapter supplies one [`NativeIdDeriver`]; its associated `Id` type is
//! the key of that adapter's cache. Derivation returning `None` is the
//! "absent" outcome: the record carries nothing the adapter can key on.

use common::{ExtensionValue, Security};
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

/// Key type of an adapter's cache
pub trait NativeId: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<T> NativeId for T where T: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

/// Derives an adapter's native identifier from a security record
///
/// Implementations must be pure: the same record always yields the same
/// result and derivation has no side effects.
pub trait NativeIdDeriver: Send + Sync {
    /// Native identifier type
    type Id: NativeId;

    /// Derive the identifier, `None` when the record is not indexable
    fn derive(&self, security: &Security) -> Option<Self::Id>;
}

/// Conversion from a raw extension value into a native identifier
pub trait FromExtensionValue: Sized {
    /// Convert, `None` when the value has the wrong shape or range
    fn from_extension(value: &ExtensionValue) -> Option<Self>;
}

impl FromExtensionValue for u32 {
    fn from_extension(value: &ExtensionValue) -> Option<Self> {
        match value {
            ExtensionValue::Text(s) => s.trim().parse().ok(),
            other => other.as_u64().and_then(|v| Self::try_from(v).ok()),
        }
    }
}

impl FromExtensionValue for u64 {
    fn from_extension(value: &ExtensionValue) -> Option<Self> {
        match value {
            ExtensionValue::Text(s) => s.trim().parse().ok(),
            other => other.as_u64(),
        }
    }
}

impl FromExtensionValue for i64 {
    fn from_extension(value: &ExtensionValue) -> Option<Self> {
        match value {
            ExtensionValue::Text(s) => s.trim().parse().ok(),
            other => other.as_i64(),
        }
    }
}

impl FromExtensionValue for String {
    fn from_extension(value: &ExtensionValue) -> Option<Self> {
        match value {
            ExtensionValue::Text(s) if !s.is_empty() => Some(s.clone()),
            ExtensionValue::Int(_) | ExtensionValue::UInt(_) => Some(value.to_string()),
            _ => None,
        }
    }
}

/// Reads the native id from one named extension key
///
/// ```
/// use common::Security;
/// use security_cache::{ExtensionKeyDeriver, NativeIdDeriver};
///
/// let deriver = ExtensionKeyDeriver::<u32>::new("zerodha.instrument_token");
/// let nifty = Security::new("NIFTY 50", "NSE").with_extension("zerodha.instrument_token", 256_265_u32);
/// assert_eq!(deriver.derive(&nifty), Some(256_265));
/// assert_eq!(deriver.derive(&Security::new("SBER", "TQBR")), None);
/// ```
#[derive(Debug, Clone)]
pub struct ExtensionKeyDeriver<K> {
    key: String,
    _marker: PhantomData<fn() -> K>,
}

impl<K> ExtensionKeyDeriver<K> {
    /// Create a deriver reading `key`
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            _marker: PhantomData,
        }
    }

    /// Extension key this deriver reads
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<K> NativeIdDeriver for ExtensionKeyDeriver<K>
where
    K: NativeId + FromExtensionValue,
{
    type Id = K;

    fn derive(&self, security: &Security) -> Option<K> {
        security.extension(&self.key).and_then(K::from_extension)
    }
}

/// Adapts a closure into a deriver
pub struct FnDeriver<F, K> {
    derive: F,
    _marker: PhantomData<fn() -> K>,
}

impl<F, K> FnDeriver<F, K>
where
    F: Fn(&Security) -> Option<K> + Send + Sync,
    K: NativeId,
{
    /// Wrap `derive`
    #[must_use]
    pub const fn new(derive: F) -> Self {
        Self {
            derive,
            _marker: PhantomData,
        }
    }
}

impl<F, K> NativeIdDeriver for FnDeriver<F, K>
where
    F: Fn(&Security) -> Option<K> + Send + Sync,
    K: NativeId,
{
    type Id = K;

    fn derive(&self, security: &Security) -> Option<K> {
        (self.derive)(security)
    }
}
