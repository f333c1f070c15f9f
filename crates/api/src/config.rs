//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BOOKSTORE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `JWT_SECRET_KEY` - HMAC signing key for access and refresh tokens (min 32 chars, high entropy)
//!
//! ## Optional
//! - `BOOKSTORE_HOST` - Bind address (default: 127.0.0.1)
//! - `BOOKSTORE_PORT` - Listen port (default: 8080)
//! - `JWT_ACCESS_TTL_MINUTES` - Access token lifetime (default: 15)
//! - `JWT_REFRESH_TTL_DAYS` - Refresh token lifetime (default: 30)
//! - `RATELIMIT_ENABLED` - Enable per-IP rate limiting (default: true)
//! - `RATELIMIT_PER_MINUTE` - Requests allowed per client IP per minute (default: 100)
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated origins, or `*` (default: *)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use chrono::Duration;
use secrecy::SecretString;
use thiserror::Error;

const JWT_SECRET_VAR: &str = "JWT_SECRET_KEY";
const MIN_JWT_SECRET_LENGTH: usize = 32;
const MAX_TOKEN_TTL_DAYS: i64 = 3650;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Matched case-insensitively against the signing key.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-", "changeme", "replace", "placeholder", "example", "secret", "password",
    "bookstore", "xxx", "todo",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Bookstore API configuration.
#[derive(Debug, Clone)]
pub struct BookstoreConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Token signing configuration
    pub jwt: JwtConfig,
    /// Per-IP request throttling
    pub rate_limit: RateLimitConfig,
    /// Allowed CORS origins; empty means any origin
    pub cors_allowed_origins: Vec<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// JWT signing configuration.
///
/// Implements `Debug` manually to redact the signing key.
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 signing key
    pub secret: SecretString,
    /// Lifetime of access tokens
    pub access_ttl: Duration,
    /// Lifetime of refresh tokens
    pub refresh_ttl: Duration,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            per_minute: 100,
        }
    }
}

impl BookstoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = database_url()?;
        let host = parse_env("BOOKSTORE_HOST", "127.0.0.1")?;
        let port = parse_env("BOOKSTORE_PORT", "8080")?;

        let jwt = JwtConfig::from_env()?;
        let rate_limit = RateLimitConfig {
            enabled: parse_env("RATELIMIT_ENABLED", "true")?,
            per_minute: parse_env("RATELIMIT_PER_MINUTE", "100")?,
        };
        if rate_limit.per_minute == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "RATELIMIT_PER_MINUTE".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let cors_allowed_origins =
            parse_origins(&env_or("CORS_ALLOWED_ORIGINS", "*"));

        Ok(Self {
            database_url,
            host,
            port,
            jwt,
            rate_limit,
            cors_allowed_origins,
            sentry_dsn: optional_env("SENTRY_DSN"),
            sentry_environment: optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = required_env(JWT_SECRET_VAR)?;
        check_signing_key(&secret)
            .map_err(|reason| ConfigError::InsecureSecret(JWT_SECRET_VAR.to_string(), reason))?;

        let access_ttl = token_ttl(
            "JWT_ACCESS_TTL_MINUTES",
            parse_env("JWT_ACCESS_TTL_MINUTES", "15")?,
            Duration::try_minutes,
        )?;
        let refresh_ttl = token_ttl(
            "JWT_REFRESH_TTL_DAYS",
            parse_env("JWT_REFRESH_TTL_DAYS", "30")?,
            Duration::try_days,
        )?;

        Ok(Self {
            secret: SecretString::from(secret),
            access_ttl,
            refresh_ttl,
        })
    }
}

/// A positive token lifetime of at most ten years.
fn token_ttl(
    key: &str,
    amount: i64,
    unit: fn(i64) -> Option<Duration>,
) -> Result<Duration, ConfigError> {
    if amount <= 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "token lifetime must be positive".to_string(),
        ));
    }
    unit(amount)
        .filter(|ttl| *ttl <= Duration::days(MAX_TOKEN_TTL_DAYS))
        .ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                key.to_string(),
                "token lifetime is out of range".to_string(),
            )
        })
}

fn required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// `BOOKSTORE_DATABASE_URL`, then the generic `DATABASE_URL`.
fn database_url() -> Result<SecretString, ConfigError> {
    std::env::var("BOOKSTORE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar("BOOKSTORE_DATABASE_URL".to_string()))
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_or(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Split a comma-separated origin list. `*` anywhere means any origin.
fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    if origins.iter().any(|o| o == "*") {
        return Vec::new();
    }
    origins
}

/// Shannon entropy in bits per character.
fn bits_per_char(s: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
    }

    let total: u32 = counts.values().sum();
    if total == 0 {
        return 0.0;
    }

    counts
        .values()
        .map(|&n| {
            let p = f64::from(n) / f64::from(total);
            -p * p.log2()
        })
        .sum()
}

/// Reject signing keys that are short, look like a placeholder, or are too
/// repetitive to be random.
fn check_signing_key(key: &str) -> Result<(), String> {
    if key.len() < MIN_JWT_SECRET_LENGTH {
        return Err(format!(
            "must be at least {MIN_JWT_SECRET_LENGTH} characters (got {})",
            key.len()
        ));
    }

    let lower = key.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(**p)) {
        return Err(format!("looks like a placeholder (contains '{pattern}')"));
    }

    let entropy = bits_per_char(key);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(format!(
            "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}); generate it randomly"
        ));
    }

    Ok(())
}
