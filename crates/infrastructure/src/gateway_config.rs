use std::env;
use std::str::FromStr;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tablegate_core::{AppError, AppResult, DeploymentMode};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT_SECONDS: u64 = 5;

/// Runtime configuration of the gateway adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Controls whether rendered queries are attached to execution failures.
    pub deployment_mode: DeploymentMode,
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Upper bound of pooled connections.
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection.
    pub acquire_timeout_seconds: u64,
}

impl GatewayConfig {
    /// Loads configuration from `.env` and the process environment.
    pub fn load() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let deployment_mode = match lookup("TABLEGATE_ENV") {
            Some(value) => DeploymentMode::from_str(value.as_str()).unwrap_or_else(|_| {
                warn!(value = %value, "unrecognised TABLEGATE_ENV, using development");
                DeploymentMode::Development
            }),
            None => DeploymentMode::default(),
        };
        let database_url = required_env(&lookup, "DATABASE_URL")?;
        let max_connections =
            optional_env(&lookup, "DATABASE_MAX_CONNECTIONS")?.unwrap_or(DEFAULT_MAX_CONNECTIONS);
        if max_connections == 0 {
            return Err(AppError::Validation(
                "DATABASE_MAX_CONNECTIONS must be greater than zero".to_owned(),
            ));
        }
        let acquire_timeout_seconds = optional_env(&lookup, "DATABASE_ACQUIRE_TIMEOUT_SECONDS")?
            .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_SECONDS);

        Ok(Self {
            deployment_mode,
            database_url,
            max_connections,
            acquire_timeout_seconds,
        })
    }
}

/// Initializes tracing subscriber for the process.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

/// Connects the pool and applies pending catalog migrations.
pub async fn connect_pool(config: &GatewayConfig) -> AppResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .connect(config.database_url.as_str())
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    info!(
        max_connections = config.max_connections,
        mode = config.deployment_mode.as_str(),
        "database pool ready"
    );

    Ok(pool)
}

fn required_env(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> AppResult<String> {
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn optional_env<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> AppResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}"))),
        _ => Ok(None),
    }
}
