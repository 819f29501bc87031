use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::auth::password::hash_password;
use crate::config::AdminConfig;
use crate::users::{repo_types::non_blank, NewUser, User, UserRepository};

const DEFAULT_ADMIN_USERNAME: &str = "admin";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[derive(Debug)]
pub enum BootstrapOutcome {
    UsersExist(i64),
    MissingConfig,
    Created(User),
}

/// Creates the configured admin account when there are no active users yet.
pub async fn ensure_initial_admin(
    users: &dyn UserRepository,
    cfg: &AdminConfig,
) -> anyhow::Result<BootstrapOutcome> {
    let count = users.count_active().await?;
    if count > 0 {
        info!(count, "users already exist, skipping admin bootstrap");
        return Ok(BootstrapOutcome::UsersExist(count));
    }

    info!("no active users, creating admin from configuration");
    let email = cfg.email.trim();
    if email.is_empty() {
        warn!("ADMIN_EMAIL is not set, no admin created");
        return Ok(BootstrapOutcome::MissingConfig);
    }
    if cfg.password.is_empty() {
        warn!("ADMIN_PASSWORD is not set, no admin created");
        return Ok(BootstrapOutcome::MissingConfig);
    }
    if !is_valid_email(email) {
        warn!(%email, "ADMIN_EMAIL is not a valid address, no admin created");
        return Ok(BootstrapOutcome::MissingConfig);
    }

    let username = non_blank(&cfg.username).unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string());
    let password_hash = hash_password(&cfg.password).await?;
    let user = users
        .create(&NewUser {
            username,
            email: email.to_string(),
            password_hash,
            first_name: non_blank(&cfg.first_name),
            last_name: non_blank(&cfg.last_name),
        })
        .await?;

    info!(user_id = user.id, username = %user.username, email = %user.email, "admin user created");
    Ok(BootstrapOutcome::Created(user))
}
