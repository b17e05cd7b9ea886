//! Test utilities
//!
//! Manual mock implementations and test fixtures for unit testing.
//!
//! Why manual mocks instead of mockall?
//! - mockall has lifetime issues with traits containing `&str` parameters
//! - Manual mocks are more explicit and easier to debug
//! - We control exactly what they return without macro magic
//!
//! Repository adapters and the HTTP layer are tested against an in-memory
//! SQLite database instead (see `fixtures::test_db`).

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
