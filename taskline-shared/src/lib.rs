//! # Taskline Shared Library
//!
//! Shared types and business logic used by the Taskline API server.
//!
//! ## Module Organization
//!
//! - `auth`: Token codec, password hashing, refresh-token registry,
//!   auth orchestration, and the role policy table
//! - `db`: Database pool management
//! - `models`: Database models and filtered search operations
//! - `query`: Filter and pagination primitives

pub mod auth;
pub mod db;
pub mod models;
pub mod query;

/// Current version of the Taskline shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
