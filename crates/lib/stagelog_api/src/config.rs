//! API server configuration.

use chrono::Duration;
use thiserror::Error;

use stagelog_core::models::attempt::LockoutPolicy;

/// Configuration faults detected at startup. None of these may surface
/// at request time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set and non-empty")]
    MissingVar(&'static str),

    #[error("{0} must be an integer, got '{1}'")]
    InvalidNumber(&'static str, String),

    #[error("REFRESH_TOKEN_PEPPER must differ from JWT_SECRET")]
    PepperEqualsSecret,
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8080").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Token signing secret.
    pub jwt_secret: String,
    /// Keying secret for the refresh-token digest, distinct from the
    /// signing secret.
    pub refresh_token_pepper: String,
    /// Access token lifetime in seconds.
    pub access_token_ttl_secs: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_token_ttl_secs: i64,
    /// Failures before a (handle, address) pair is locked.
    pub max_login_failures: i32,
    /// Sliding window in which failures accumulate, in seconds.
    pub login_failure_window_secs: i64,
    /// Lock duration once the limit is reached, in seconds.
    pub login_lock_secs: i64,
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable                     | Default                                  |
    /// |------------------------------|------------------------------------------|
    /// | `BIND_ADDR`                  | `127.0.0.1:8080`                         |
    /// | `DATABASE_URL`               | `postgres://localhost:5432/stagelog`     |
    /// | `JWT_SECRET`                 | required                                 |
    /// | `REFRESH_TOKEN_PEPPER`       | required, must differ from `JWT_SECRET`  |
    /// | `ACCESS_TOKEN_TTL_SECS`      | `3600` (1 hour)                          |
    /// | `REFRESH_TOKEN_TTL_SECS`     | `1209600` (14 days)                      |
    /// | `MAX_LOGIN_FAILURES`         | `5`                                      |
    /// | `LOGIN_FAILURE_WINDOW_SECS`  | `600` (10 minutes)                       |
    /// | `LOGIN_LOCK_SECS`            | `900` (15 minutes)                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = required("JWT_SECRET")?;
        let refresh_token_pepper = required("REFRESH_TOKEN_PEPPER")?;
        if refresh_token_pepper == jwt_secret {
            return Err(ConfigError::PepperEqualsSecret);
        }

        Ok(Self {
            bind_addr: optional("BIND_ADDR", "127.0.0.1:8080"),
            database_url: optional("DATABASE_URL", "postgres://localhost:5432/stagelog"),
            jwt_secret,
            refresh_token_pepper,
            access_token_ttl_secs: numeric("ACCESS_TOKEN_TTL_SECS", 3600)?,
            refresh_token_ttl_secs: numeric("REFRESH_TOKEN_TTL_SECS", 1_209_600)?,
            max_login_failures: numeric("MAX_LOGIN_FAILURES", 5)? as i32,
            login_failure_window_secs: numeric("LOGIN_FAILURE_WINDOW_SECS", 600)?,
            login_lock_secs: numeric("LOGIN_LOCK_SECS", 900)?,
        })
    }

    /// Lockout tuning derived from this configuration.
    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy {
            max_failures: self.max_login_failures,
            failure_window: Duration::seconds(self.login_failure_window_secs),
            lock_duration: Duration::seconds(self.login_lock_secs),
        }
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

fn optional(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn numeric(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(name, value)),
        Err(_) => Ok(default),
    }
}
