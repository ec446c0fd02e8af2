//! Database module for SQLite operations.
//!
//! This module provides:
//! - Pool construction, pragmas and schema setup
//! - The generic repository and its per-entity extensions
//! - Store error classification

pub mod error;
pub mod migrations;
pub mod repo;

pub use error::{StoreError, StoreResult};
pub use migrations::init_db;
pub use repo::Repository;
