//! Security (tradable instrument) records
//!
//! A [`Security`] is the unit stored by the persistent registry and cached by
//! adapters. Records are shared as [`SecurityRef`] handles; two handles name
//! the same record only when they point at the same allocation, so identity
//! checks go through [`same_security`] rather than field equality.
//!
//! The same struct doubles as lookup criteria: unset fields match anything.

use crate::types::{Px, Ts};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a security record
pub type SecurityRef = Arc<Security>;

/// Security type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityType {
    /// Equity/Stock instrument
    Stock,
    /// Index instrument
    Index,
    /// Future contract
    Future,
    /// Option contract
    Option,
    /// Currency pair
    Currency,
    /// Crypto spot pair
    CryptoCurrency,
    /// Commodity instrument
    Commodity,
    /// Bond
    Bond,
}

/// Option type for derivatives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    /// Call option
    Call,
    /// Put option
    Put,
}

/// A single adapter-specific extension value
///
/// Kept as a closed enum so records stay bincode-encodable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExtensionValue {
    /// Signed integer
    Int(i64),
    /// Unsigned integer (exchange tokens, instrument ids)
    UInt(u64),
    /// Free text (venue symbols)
    Text(String),
    /// Flag
    Bool(bool),
    /// Floating point value
    Decimal(f64),
}

impl ExtensionValue {
    /// Value as u64 when it is a non-negative integer
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            Self::Int(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Value as i64 when it is an integer in range
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Value as text when it is text
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ExtensionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
        }
    }
}

impl From<u32> for ExtensionValue {
    fn from(v: u32) -> Self {
        Self::UInt(u64::from(v))
    }
}

impl From<u64> for ExtensionValue {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<i64> for ExtensionValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for ExtensionValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ExtensionValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<bool> for ExtensionValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for ExtensionValue {
    fn from(v: f64) -> Self {
        Self::Decimal(v)
    }
}

/// Adapter-specific side-channel metadata attached to a security
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionInfo(BTreeMap<String, ExtensionValue>);

impl ExtensionInfo {
    /// Create empty extension info
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ExtensionValue> {
        self.0.get(key)
    }

    /// Insert a value, returning the previous one
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ExtensionValue>,
    ) -> Option<ExtensionValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Number of keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no keys are present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate keys and values in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExtensionValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<ExtensionValue>> FromIterator<(K, V)> for ExtensionInfo {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Complete security definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Security {
    /// Security identifier (`CODE@BOARD`)
    pub id: String,

    /// Ticker code (e.g., "NIFTY24DEC24000CE")
    pub code: String,

    /// Board / exchange code (e.g., "NFO")
    pub board: String,

    /// Display name
    pub name: String,

    /// Security type
    pub security_type: Option<SecurityType>,

    /// Quote currency
    pub currency: Option<String>,

    /// Minimum price movement
    pub price_step: Option<Px>,

    /// Minimum volume movement
    pub volume_step: Option<Px>,

    /// Contract multiplier (lot size)
    pub multiplier: Option<Px>,

    /// Price decimals
    pub decimals: Option<u32>,

    /// Expiry for derivatives
    pub expiry: Option<Ts>,

    /// Strike for options
    pub strike: Option<Px>,

    /// Option type (for options)
    pub option_type: Option<OptionType>,

    /// Underlying security id for derivatives
    pub underlying_id: Option<String>,

    /// Adapter-specific metadata
    pub extension_info: Option<ExtensionInfo>,
}

impl Security {
    /// Create a security from code and board, deriving its id
    #[must_use]
    pub fn new(code: impl Into<String>, board: impl Into<String>) -> Self {
        let code = code.into();
        let board = board.into();
        Self {
            id: format!("{code}@{board}"),
            code,
            board,
            ..Self::default()
        }
    }

    /// Empty criteria; matches every security
    #[must_use]
    pub fn criteria() -> Self {
        Self::default()
    }

    /// Set the display name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the security type
    #[must_use]
    pub const fn with_type(mut self, security_type: SecurityType) -> Self {
        self.security_type = Some(security_type);
        self
    }

    /// Attach one extension key, creating the extension info when absent
    #[must_use]
    pub fn with_extension(
        mut self,
        key: impl Into<String>,
        value: impl Into<ExtensionValue>,
    ) -> Self {
        self.extension_info
            .get_or_insert_with(ExtensionInfo::new)
            .insert(key, value);
        self
    }

    /// Look up a single extension value
    #[must_use]
    pub fn extension(&self, key: &str) -> Option<&ExtensionValue> {
        self.extension_info.as_ref().and_then(|info| info.get(key))
    }

    /// Whether the record carries a usable security id
    #[must_use]
    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// Partial match against a criteria template
    ///
    /// Empty strings and `None` fields in `criteria` match anything. `id` and
    /// `board` compare case-insensitively; `code` and `name` match on a
    /// case-insensitive substring. Extension info is adapter data and never
    /// takes part in generic matching.
    #[must_use]
    pub fn matches(&self, criteria: &Self) -> bool {
        if !criteria.id.is_empty() && !self.id.eq_ignore_ascii_case(&criteria.id) {
            return false;
        }
        if !criteria.board.is_empty() && !self.board.eq_ignore_ascii_case(&criteria.board) {
            return false;
        }
        if !criteria.code.is_empty() && !contains_ignore_case(&self.code, &criteria.code) {
            return false;
        }
        if !criteria.name.is_empty() && !contains_ignore_case(&self.name, &criteria.name) {
            return false;
        }

        matches_opt(self.security_type.as_ref(), criteria.security_type.as_ref())
            && matches_opt(self.currency.as_ref(), criteria.currency.as_ref())
            && matches_opt(self.expiry.as_ref(), criteria.expiry.as_ref())
            && matches_opt(self.strike.as_ref(), criteria.strike.as_ref())
            && matches_opt(self.option_type.as_ref(), criteria.option_type.as_ref())
            && matches_opt(self.underlying_id.as_ref(), criteria.underlying_id.as_ref())
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Handle identity: true only when both handles point at the same record
#[must_use]
pub fn same_security(a: &SecurityRef, b: &Security) -> bool {
    std::ptr::eq(Arc::as_ptr(a), b)
}

fn matches_opt<T: PartialEq>(value: Option<&T>, wanted: Option<&T>) -> bool {
    wanted.is_none_or(|w| value == Some(w))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}
