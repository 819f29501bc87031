use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgSslMode};
use thiserror::Error;

const DEV_SESSION_SECRET: &str = "supersecret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::Invalid {
                key: "APP_ENV",
                value: s.to_string(),
            }),
        }
    }
}

/// Connection settings, either a full URL or the discrete POSTGRES_* fields.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub ssl_mode: String,
    pub max_connections: u32,
    pub auto_migrate: bool,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        if let Some(url) = &self.url {
            return Ok(url.parse::<PgConnectOptions>()?);
        }
        let ssl_mode = self.ssl_mode.parse::<PgSslMode>().map_err(|_| ConfigError::Invalid {
            key: "POSTGRES_SSL",
            value: self.ssl_mode.clone(),
        })?;
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(ssl_mode))
    }
}

/// Account created on first start when the users table has no active rows.
#[derive(Debug, Clone, Default)]
pub struct AdminConfig {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub session_secret: String,
    pub database: DatabaseConfig,
    pub admin: AdminConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let environment = match get("APP_ENV") {
            Some(v) => v.parse()?,
            None => Environment::Development,
        };

        let session_secret = match get("SESSION_SECRET") {
            Some(secret) => secret,
            None if environment.is_production() => {
                return Err(ConfigError::Missing("SESSION_SECRET"))
            }
            None => DEV_SESSION_SECRET.to_string(),
        };

        let url = get("DATABASE_URL");
        let (name, user) = if url.is_some() {
            (or("POSTGRES_DB", ""), or("POSTGRES_USER", ""))
        } else {
            (
                get("POSTGRES_DB").ok_or(ConfigError::Missing("POSTGRES_DB"))?,
                get("POSTGRES_USER").ok_or(ConfigError::Missing("POSTGRES_USER"))?,
            )
        };

        let database = DatabaseConfig {
            url,
            host: or("POSTGRES_HOST", "localhost"),
            port: parse_or(get("POSTGRES_PORT"), "POSTGRES_PORT", 5432)?,
            name,
            user,
            // passwords keep surrounding whitespace
            password: lookup("POSTGRES_PASSWORD").unwrap_or_default(),
            ssl_mode: or("POSTGRES_SSL", "disable"),
            max_connections: parse_or(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 10)?,
            auto_migrate: parse_bool(get("AUTO_MIGRATE"), "AUTO_MIGRATE", true)?,
        };

        let admin = AdminConfig {
            username: or("ADMIN_USERNAME", ""),
            email: or("ADMIN_EMAIL", ""),
            password: lookup("ADMIN_PASSWORD").unwrap_or_default(),
            first_name: or("ADMIN_FIRST_NAME", ""),
            last_name: or("ADMIN_LAST_NAME", ""),
        };

        Ok(Self {
            environment,
            host: or("APP_HOST", "0.0.0.0"),
            port: parse_or(get("APP_PORT"), "APP_PORT", 8080)?,
            session_secret,
            database,
            admin,
        })
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn parse_bool(raw: Option<String>, key: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = raw else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value }),
    }
}
