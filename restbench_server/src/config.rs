//! Server configuration loaded from environment variables

use axum::http::HeaderValue;
use sqlx::postgres::PgConnectOptions;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Default origin allowed outside production (the frontend dev server)
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,

    /// Port for the history API
    pub port: u16,

    /// Where request logs are persisted
    pub database: DatabaseConfig,

    /// Maximum pooled database connections
    pub max_connections: u32,

    /// Cross-origin policy for browser clients
    pub cors: CorsPolicy,

    /// Directory of a built frontend to serve, if any
    pub static_dir: Option<PathBuf>,
}

/// Backing store selection
#[derive(Debug, Clone)]
pub enum DatabaseConfig {
    /// PostgreSQL, from `DATABASE_URL` or the discrete `DB_*` variables
    Postgres(PgConnectOptions),

    /// Process-local store, selected with `DATABASE_URL=memory`
    Memory,
}

/// Which origins may call the API from a browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    /// Any origin (production builds serve the frontend themselves)
    Permissive,

    /// Exactly one origin
    Origin(HeaderValue),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_production = lookup("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let cors = if is_production {
            CorsPolicy::Permissive
        } else {
            let origin = lookup("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());
            let value = HeaderValue::from_str(&origin)
                .map_err(|_| ConfigError::InvalidOrigin(origin.clone()))?;
            CorsPolicy::Origin(value)
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "3001".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            database: DatabaseConfig::from_lookup(&lookup)?,
            max_connections: lookup("DB_MAX_CONNECTIONS")
                .map(|v| v.parse().map_err(|_| ConfigError::InvalidNumber("DB_MAX_CONNECTIONS")))
                .transpose()?
                .unwrap_or(10),
            cors,
            static_dir: lookup("STATIC_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
        })
    }

    /// Address the listener binds to
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL").filter(|u| !u.is_empty()) {
            if url == "memory" {
                return Ok(DatabaseConfig::Memory);
            }
            let options = PgConnectOptions::from_str(&url)
                .map_err(|e| ConfigError::InvalidDatabaseUrl(e.to_string()))?;
            return Ok(DatabaseConfig::Postgres(options));
        }

        let host = lookup("DB_HOST").ok_or(ConfigError::MissingEnv("DATABASE_URL or DB_HOST"))?;
        let mut options = PgConnectOptions::new().host(&host);
        if let Some(port) = lookup("DB_PORT") {
            options = options.port(port.parse().map_err(|_| ConfigError::InvalidPort)?);
        }
        if let Some(user) = lookup("DB_USER") {
            options = options.username(&user);
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            options = options.password(&password);
        }
        if let Some(name) = lookup("DB_NAME") {
            options = options.database(&name);
        }
        Ok(DatabaseConfig::Postgres(options))
    }

    /// Human-readable target without credentials
    pub fn describe(&self) -> String {
        match self {
            DatabaseConfig::Memory => "in-memory store".to_string(),
            DatabaseConfig::Postgres(options) => format!(
                "postgres://{}:{}/{}",
                options.get_host(),
                options.get_port(),
                options.get_database().unwrap_or_default()
            ),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid number in {0}")]
    InvalidNumber(&'static str),

    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("Invalid CORS origin: {0}")]
    InvalidOrigin(String),
}
