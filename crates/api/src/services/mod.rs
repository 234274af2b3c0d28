//! Startup services.

pub mod bootstrap;

pub use bootstrap::{bootstrap_super_admin, BootstrapError, BootstrapOutcome};
