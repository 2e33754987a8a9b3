use std::{env, str::FromStr};

use thiserror::Error;

use crate::serializers::Links;

/// Secret used when no `JWT_SECRET` is set outside production.
pub const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";

/// ConfigError
///
/// Raised by `AppConfig::load` when the environment is incomplete or malformed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// AppConfig
///
/// Holds the application's entire configuration state. Immutable once loaded and
/// pulled into handlers and extractors via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls strictness and the local auth bypass.
    pub env: Env,
    // Postgres connection string. `None` (local only) selects the in-memory store.
    pub db_url: Option<String>,
    pub db_max_connections: u32,
    // Secret key used to sign and validate JWTs (HS256).
    pub jwt_secret: String,
    // Lifetime of an issued token, in seconds.
    pub jwt_expiration_secs: i64,
    // Window after the original issue time during which a token may be refreshed.
    pub jwt_refresh_expiration_secs: i64,
    pub jwt_allow_refresh: bool,
    // Absolute base URL used to build hyperlinks (no trailing slash).
    pub public_url: String,
    // Mount point of the resource routes (e.g. "/api").
    pub api_prefix: String,
    pub bind_addr: String,
    pub page_size: i64,
    // Reject comments on blogposts that have `allow_comments == false`.
    pub enforce_comments_allowed: bool,
}

/// Env
///
/// The runtime context: `Local` for development conveniences, `Production` for
/// fail-fast secrets and no bypasses.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking values for test setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_url: None,
            db_max_connections: 5,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            jwt_expiration_secs: 300,
            jwt_refresh_expiration_secs: 7 * 24 * 60 * 60,
            jwt_allow_refresh: true,
            public_url: "http://localhost:3000".to_string(),
            api_prefix: "/api".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            page_size: 10,
            enforce_comments_allowed: false,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables. Production demands
    /// `DATABASE_URL` and `JWT_SECRET`; local falls back to defaults and the
    /// in-memory store.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let env = match env::var("APP_ENV").unwrap_or_default().as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let db_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        let jwt_secret = env::var("JWT_SECRET").ok().filter(|secret| !secret.is_empty());

        let (db_url, jwt_secret) = match env {
            Env::Production => (
                Some(db_url.ok_or(ConfigError::Missing("DATABASE_URL"))?),
                jwt_secret.ok_or(ConfigError::Missing("JWT_SECRET"))?,
            ),
            Env::Local => (db_url, jwt_secret.unwrap_or(defaults.jwt_secret)),
        };

        let page_size = parse_var("PAGE_SIZE", defaults.page_size)?;
        if page_size <= 0 {
            return Err(ConfigError::Invalid {
                name: "PAGE_SIZE",
                value: page_size.to_string(),
            });
        }

        Ok(Self {
            env,
            db_url,
            db_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", defaults.db_max_connections)?,
            jwt_secret,
            jwt_expiration_secs: parse_var("JWT_EXPIRATION_SECS", defaults.jwt_expiration_secs)?,
            jwt_refresh_expiration_secs: parse_var(
                "JWT_REFRESH_EXPIRATION_SECS",
                defaults.jwt_refresh_expiration_secs,
            )?,
            jwt_allow_refresh: parse_var("JWT_ALLOW_REFRESH", defaults.jwt_allow_refresh)?,
            public_url: env::var("PUBLIC_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_url),
            api_prefix: env::var("API_PREFIX")
                .map(|prefix| normalize_prefix(&prefix))
                .unwrap_or(defaults.api_prefix),
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            page_size,
            enforce_comments_allowed: parse_var(
                "ENFORCE_COMMENTS_ALLOWED",
                defaults.enforce_comments_allowed,
            )?,
        })
    }

    /// Hyperlink builder for the configured base URL and prefix.
    pub fn links(&self) -> Links {
        Links::new(&self.public_url, &self.api_prefix)
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        _ => Ok(default),
    }
}

// "/api/" and "api" both become "/api"; "/" becomes "".
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
