//! Configuration management for the API server
//!
//! Configuration comes from environment variables, with a `.env` file loaded
//! first when present.
//!
//! # Environment Variables
//!
//! - `API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `API_PORT`: Port to bind to (default: 3000)
//! - `CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
//! - `PRODUCTION`: Enables HSTS (default: false)
//! - `CHORELY_STORAGE`: `postgres` (default) or `memory`
//! - `DATABASE_URL`: PostgreSQL connection string (required for `postgres`)
//! - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
//! - `JWT_SECRET`: Token signing key, at least 32 characters (required)
//! - `SESSION_TTL_HOURS`: Session lifetime (default: 24)
//! - `CHORELY_COMPLETION_POLICY`: `require_assignment` (default) or `self_claim`
//! - `ARGON2_MEMORY_KIB` / `ARGON2_ITERATIONS` / `ARGON2_PARALLELISM`:
//!   password hashing cost (default: 65536 / 3 / 4)
//!
//! # Example
//!
//! ```no_run
//! use chorely_api::config::Config;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! println!("Server will listen on {}", config.bind_address());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;

use anyhow::Context;
use chorely_shared::auth::password::HashCost;
use chorely_shared::services::CompletionPolicy;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,

    pub storage: StorageBackend,

    pub database: DatabaseConfig,

    pub jwt: JwtConfig,

    pub completion_policy: CompletionPolicy,

    pub password_hash: HashCost,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,

    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Adds Strict-Transport-Security to responses
    pub production: bool,
}

/// Where state is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,

    /// Process-local, lost on restart
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("unknown storage backend '{}'", other),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Postgres => f.write_str("postgres"),
            StorageBackend::Memory => f.write_str("memory"),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; empty with the memory backend
    pub url: String,

    pub max_connections: u32,
}

/// Session token configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// HS256 signing key
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    pub session_ttl_hours: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("session_ttl_hours", &self.session_ttl_hours)
            .finish()
    }
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails
    /// to parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let storage: StorageBackend = var("CHORELY_STORAGE", "postgres").parse()?;

        let database_url = match storage {
            StorageBackend::Postgres => lookup("DATABASE_URL")
                .context("DATABASE_URL environment variable is required")?,
            StorageBackend::Memory => lookup("DATABASE_URL").unwrap_or_default(),
        };

        let jwt_secret =
            lookup("JWT_SECRET").context("JWT_SECRET environment variable is required")?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let session_ttl_hours: i64 = var("SESSION_TTL_HOURS", "24")
            .parse()
            .context("SESSION_TTL_HOURS must be an integer")?;
        if session_ttl_hours <= 0 {
            anyhow::bail!("SESSION_TTL_HOURS must be positive");
        }

        let default_cost = HashCost::default();

        Ok(Self {
            api: ApiConfig {
                host: var("API_HOST", "0.0.0.0"),
                port: var("API_PORT", "3000")
                    .parse()
                    .context("API_PORT must be a port number")?,
                cors_origins: var("CORS_ORIGINS", "*")
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect(),
                production: var("PRODUCTION", "false")
                    .parse()
                    .context("PRODUCTION must be true or false")?,
            },
            storage,
            database: DatabaseConfig {
                url: database_url,
                max_connections: var("DATABASE_MAX_CONNECTIONS", "10")
                    .parse()
                    .context("DATABASE_MAX_CONNECTIONS must be an integer")?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                session_ttl_hours,
            },
            completion_policy: var("CHORELY_COMPLETION_POLICY", "require_assignment")
                .parse()
                .map_err(anyhow::Error::msg)?,
            password_hash: HashCost {
                memory_kib: parse_or(&lookup, "ARGON2_MEMORY_KIB", default_cost.memory_kib)?,
                iterations: parse_or(&lookup, "ARGON2_ITERATIONS", default_cost.iterations)?,
                parallelism: parse_or(&lookup, "ARGON2_PARALLELISM", default_cost.parallelism)?,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.jwt.session_ttl_hours)
    }
}

fn parse_or<F>(lookup: &F, key: &str, default: u32) -> anyhow::Result<u32>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .parse()
            .with_context(|| format!("{} must be an integer", key)),
        None => Ok(default),
    }
}
