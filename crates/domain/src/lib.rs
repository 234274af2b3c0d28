//! Domain layer for the Stockroom backend.
//!
//! This crate contains:
//! - Domain models (Item, Zone/Furniture/Drawer, User, Loan, Notification)
//! - The loan and stock services with their storage traits
//! - Domain error types

pub mod models;
pub mod services;
