//! Shared utilities for the Stockroom backend.
//!
//! This crate provides functionality used across the other crates:
//! - Password hashing with Argon2id
//! - JWT access tokens
//! - Reusable validators

pub mod jwt;
pub mod password;
pub mod validation;
