/// Configuration management for the API server
///
/// Configuration comes from environment variables, with a `.env` file loaded
/// first when present (development).
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `API_HOST`: host to bind to (default: 0.0.0.0)
/// - `API_PORT`: port to bind to (default: 8080)
/// - `CORS_ORIGINS`: comma-separated allowed origins (default: any)
/// - `PRODUCTION`: enables HSTS and secure cookies (default: false)
/// - `SESSION_COOKIE_NAME`: (default: workbuddy_session)
/// - `SESSION_TTL_HOURS`: session lifetime, at most one year (default: 168, one week)
/// - `SESSION_COOKIE_SECURE`: sets the `Secure` cookie flag (default: PRODUCTION)
/// - `PUBLIC_BASE_URL`: base of invitation links (default: http://localhost:8080)
/// - `RUN_MIGRATIONS`: apply migrations at startup (default: true)
/// - `SEED_DEMO_DATA`: insert demo users and projects at startup (default: false)
/// - `RUST_LOG` / `LOG_FORMAT`: read by `main` when installing the subscriber
///
/// # Example
///
/// ```no_run
/// use workbuddy_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Upper bound for `SESSION_TTL_HOURS` (366 days)
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub invitations: InvitationConfig,
    pub startup: StartupConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,

    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Session cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_hours: i64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationConfig {
    /// Invitation links point at `{public_base_url}/register?token=...`
    pub public_base_url: String,
}

/// One-off work done before the server starts listening
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupConfig {
    pub run_migrations: bool,
    pub seed_demo_data: bool,
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing or a variable has an
    /// unparseable value.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let production = parse_or(&lookup, "PRODUCTION", false)?;

        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.is_empty())
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let ttl_hours: i64 = parse_or(&lookup, "SESSION_TTL_HOURS", 24 * 7)?;
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&ttl_hours) {
            anyhow::bail!(
                "SESSION_TTL_HOURS must be between 1 and {}",
                MAX_SESSION_TTL_HOURS
            );
        }

        Ok(Self {
            api: ApiConfig {
                host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "API_PORT", 8080)?,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            },
            session: SessionConfig {
                cookie_name: lookup("SESSION_COOKIE_NAME")
                    .unwrap_or_else(|| "workbuddy_session".to_string()),
                ttl_hours,
                cookie_secure: parse_or(&lookup, "SESSION_COOKIE_SECURE", production)?,
            },
            invitations: InvitationConfig {
                public_base_url: lookup("PUBLIC_BASE_URL")
                    .unwrap_or_else(|| "http://localhost:8080".to_string()),
            },
            startup: StartupConfig {
                run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", true)?,
                seed_demo_data: parse_or(&lookup, "SEED_DEMO_DATA", false)?,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session.ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        _ => Ok(default),
    }
}
