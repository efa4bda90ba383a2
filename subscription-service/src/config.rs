//! Configuration module for subscription-service.

use secrecy::{ExposeSecret, Secret};
use service_core::config as core_config;
use service_core::error::AppError;
use sqlx::postgres::PgConnectOptions;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub connection: DatabaseConnection,
    pub max_connections: u32,
    pub min_connections: u32,
    pub run_migrations: bool,
}

/// Where to find PostgreSQL: a full URL, or the individual parts.
#[derive(Debug, Clone)]
pub enum DatabaseConnection {
    Url(Secret<String>),
    Parts {
        host: String,
        port: u16,
        name: String,
        user: String,
        password: Secret<String>,
    },
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> Result<PgConnectOptions, AppError> {
        match &self.connection {
            DatabaseConnection::Url(url) => PgConnectOptions::from_str(url.expose_secret())
                .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid DATABASE_URL: {}", e))),
            DatabaseConnection::Parts {
                host,
                port,
                name,
                user,
                password,
            } => Ok(PgConnectOptions::new()
                .host(host)
                .port(*port)
                .database(name)
                .username(user)
                .password(password.expose_secret())),
        }
    }
}

impl SubscriptionConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| AppError::ConfigError(anyhow::anyhow!("{} is required", key)))
        };

        let connection = match var("DATABASE_URL") {
            Some(url) => DatabaseConnection::Url(Secret::new(url)),
            None => DatabaseConnection::Parts {
                host: var("DB_HOST").unwrap_or_else(|| "main_db".to_string()),
                port: match var("DB_PORT") {
                    Some(port) => port.parse().map_err(|e| {
                        AppError::ConfigError(anyhow::anyhow!("Invalid DB_PORT '{}': {}", port, e))
                    })?,
                    None => 5432,
                },
                name: var("POSTGRES_DB").unwrap_or_else(|| "test".to_string()),
                user: required("POSTGRES_USER")?,
                password: Secret::new(required("POSTGRES_PASSWORD")?),
            },
        };

        Ok(Self {
            common,
            service_name: var("SERVICE_NAME")
                .unwrap_or_else(|| "subscription-service".to_string()),
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            otlp_endpoint: var("OTLP_ENDPOINT"),
            database: DatabaseConfig {
                connection,
                max_connections: var("DATABASE_MAX_CONNECTIONS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                min_connections: var("DATABASE_MIN_CONNECTIONS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
                run_migrations: var("RUN_MIGRATIONS")
                    .map(|s| !matches!(s.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no"))
                    .unwrap_or(true),
            },
        })
    }
}
