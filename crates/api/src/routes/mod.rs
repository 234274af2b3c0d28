//! HTTP route handlers.

pub mod admin_users;
pub mod auth;
pub mod health;
pub mod items;
pub mod loans;
pub mod locations;
pub mod me;
pub mod notifications;
pub mod stock;
