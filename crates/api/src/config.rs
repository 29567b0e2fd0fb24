//! Process configuration, read from the environment once at startup.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;

const DEV_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub jwt_secret: String,
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Path prefix for every API route, e.g. `/api/v1`; empty for none.
    pub api_prefix: String,
    pub token_ttl: Duration,
    pub session_cookie: String,
    pub bcrypt_cost: u32,
}

impl ApiConfig {
    /// Defaults for everything but the signing secret.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 9000,
            api_prefix: "/api/v1".to_string(),
            token_ttl: Duration::minutes(60),
            session_cookie: "token".to_string(),
            bcrypt_cost: 10,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_SECRET.to_string()
        });
        let defaults = Self::new(jwt_secret);

        let token_ttl_minutes: i64 = parsed(&lookup, "TOKEN_TTL_MINUTES", defaults.token_ttl.num_minutes())?;
        if token_ttl_minutes <= 0 {
            return Err(invalid("TOKEN_TTL_MINUTES", token_ttl_minutes));
        }

        let bcrypt_cost: u32 = parsed(&lookup, "BCRYPT_COST", defaults.bcrypt_cost)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(invalid("BCRYPT_COST", bcrypt_cost));
        }

        let session_cookie = lookup("SESSION_COOKIE").unwrap_or(defaults.session_cookie);
        if session_cookie.is_empty() || !session_cookie.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(invalid("SESSION_COOKIE", session_cookie));
        }

        Ok(Self {
            bind_addr: parsed(&lookup, "BIND_ADDR", defaults.bind_addr)?,
            port: parsed(&lookup, "PORT", defaults.port)?,
            api_prefix: normalize_prefix(&lookup("API_PREFIX").unwrap_or(defaults.api_prefix)),
            token_ttl: Duration::minutes(token_ttl_minutes),
            session_cookie,
            bcrypt_cost,
            jwt_secret: defaults.jwt_secret,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn invalid(var: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|_| invalid(var, raw)),
        None => {
            tracing::debug!(var, %default, "using default");
            Ok(default)
        }
    }
}

/// `api/v1/` -> `/api/v1`; `/` and blank -> no prefix.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
