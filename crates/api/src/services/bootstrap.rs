//! Super-admin bootstrap.
//!
//! Runs once after migrations. When `bootstrap.super_admin_name` is set and
//! no super admin exists yet, the named account is promoted, or created if
//! it does not exist.

use domain::models::Role;
use persistence::repositories::UserRepository;
use shared::password::{hash_password, PasswordError};
use tracing::{info, warn};

use crate::config::BootstrapConfig;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// What the bootstrap did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    NotConfigured,
    AlreadyPresent,
    Promoted(i64),
    Created(i64),
}

pub async fn bootstrap_super_admin(
    users: &UserRepository,
    config: &BootstrapConfig,
) -> Result<BootstrapOutcome, BootstrapError> {
    let name = config.super_admin_name.trim();
    if name.is_empty() {
        return Ok(BootstrapOutcome::NotConfigured);
    }

    if users.count_super_admins().await? > 0 {
        info!("Super admin already present, skipping bootstrap");
        return Ok(BootstrapOutcome::AlreadyPresent);
    }

    if let Some(existing) = users.find_by_name(name).await? {
        let promoted = users
            .update_role(existing.id, Role::SuperAdmin)
            .await?
            .ok_or_else(|| BootstrapError::Config(format!("User '{}' vanished", name)))?;
        info!(user_id = promoted.id, user_name = name, "Existing user promoted to super admin");
        return Ok(BootstrapOutcome::Promoted(promoted.id));
    }

    let password_hash = if config.super_admin_password.is_empty() {
        warn!(user_name = name, "Bootstrapping a super admin without a password");
        None
    } else {
        Some(hash_password(&config.super_admin_password)?)
    };

    let created = users
        .create(name, None, password_hash.as_deref(), Role::SuperAdmin)
        .await?;
    info!(user_id = created.id, user_name = name, "Super admin created");
    Ok(BootstrapOutcome::Created(created.id))
}
