//! Common types for the native-id security cache workspace

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod security;
pub mod types;

pub use security::*;
pub use types::*;
