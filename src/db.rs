use anyhow::{bail, Context};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Connection, PgConnection, PgPool,
};
use tracing::info;

use crate::config::DatabaseConfig;

const MAINTENANCE_DATABASE: &str = "postgres";
const MAX_DATABASE_NAME_LEN: usize = 63;

/// Creates the target database if missing, opens the pool and applies migrations.
pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let options = cfg.connect_options().context("build connection options")?;

    ensure_database_exists(&options).await?;

    let db = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .connect_with(options)
        .await
        .context("connect to database")?;

    if cfg.auto_migrate {
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;
        info!("migrations applied");
    } else {
        info!("AUTO_MIGRATE disabled, skipping migrations");
    }

    Ok(db)
}

/// Connects to the maintenance database and issues `CREATE DATABASE` when the target is absent.
pub async fn ensure_database_exists(options: &PgConnectOptions) -> anyhow::Result<()> {
    let Some(name) = options.get_database().map(str::to_string) else {
        bail!("database name not found in connection settings");
    };

    let admin_options = options.clone().database(MAINTENANCE_DATABASE);
    let mut conn = PgConnection::connect_with(&admin_options)
        .await
        .context("connect to maintenance database")?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&name)
            .fetch_one(&mut conn)
            .await
            .context("check whether database exists")?;

    if exists {
        info!(database = %name, "database already exists");
    } else {
        validate_database_name(&name)?;
        // identifiers cannot be bound as parameters
        sqlx::query(&format!("CREATE DATABASE {}", quote_identifier(&name)))
            .execute(&mut conn)
            .await
            .with_context(|| format!("create database {name}"))?;
        info!(database = %name, "database created");
    }

    conn.close().await?;
    Ok(())
}

pub fn validate_database_name(name: &str) -> anyhow::Result<()> {
    if name.is_empty() {
        bail!("database name cannot be empty");
    }
    if name.contains(['\'', ';', '"', '\\', '-', '/', '*']) {
        bail!("database name contains invalid characters");
    }
    if name.len() > MAX_DATABASE_NAME_LEN {
        bail!("database name too long (max {MAX_DATABASE_NAME_LEN} characters)");
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        bail!("database name cannot start with a number");
    }
    Ok(())
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
