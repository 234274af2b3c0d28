//! Persistence layer for the Stockroom backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - The transactional inventory store used by the loan and stock services

pub mod db;
pub mod entities;
pub mod inventory;
pub mod metrics;
pub mod repositories;

pub use inventory::PgInventoryStore;
