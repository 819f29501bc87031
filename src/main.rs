use std::sync::Arc;

use anyhow::Context;
use tower_sessions::ExpiredDeletion;
use tower_sessions_sqlx_store::PostgresStore;

mod app;
mod auth;
mod bootstrap;
mod config;
mod db;
mod state;
mod users;

use crate::{
    bootstrap::{ensure_initial_admin, BootstrapOutcome},
    config::AppConfig,
    state::AppState,
    users::{PgUserRepository, UserRepository},
};

const EXPIRED_SESSION_SWEEP: std::time::Duration = std::time::Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        "farmgate=debug,axum=info,tower_http=info,tower_sessions=info".to_string()
    });
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = Arc::new(AppConfig::from_env().context("load configuration")?);
    tracing::info!(environment = ?config.environment, "configuration loaded");

    let db = db::connect(&config.database).await?;
    let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(db.clone()));

    match ensure_initial_admin(users.as_ref(), &config.admin)
        .await
        .context("create initial admin user")?
    {
        BootstrapOutcome::Created(user) => {
            tracing::info!(user_id = user.id, "initial admin ready")
        }
        BootstrapOutcome::UsersExist(count) => {
            tracing::debug!(count, "admin bootstrap not needed")
        }
        BootstrapOutcome::MissingConfig => {}
    }

    let session_store = PostgresStore::new(db.clone());
    session_store
        .migrate()
        .await
        .context("migrate session store")?;
    let deletion_task = tokio::task::spawn(
        session_store
            .clone()
            .continuously_delete_expired(EXPIRED_SESSION_SWEEP),
    );

    let state = AppState::from_parts(config.clone(), users);
    let app = app::build_app(state, session_store);
    let served = app::serve(app, &config).await;

    deletion_task.abort();
    db.close().await;
    served
}
