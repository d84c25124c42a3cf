//! Test utilities and fixtures for the security cache workspace
//!
//! This crate provides:
//! - Security record factories
//! - Registry test doubles that record calls
//! - rstest fixtures
//! - Custom assertions

pub mod assertions;
pub mod factories;
pub mod fixtures;
pub mod mocks;

pub use assertions::*;
pub use factories::*;
pub use fixtures::*;
pub use mocks::*;
