use std::str::FromStr;

use jsonwebtoken::Algorithm;
use thiserror::Error;

pub const API_PREFIX: &str = "/social";

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_PASSWORD_LENGTH: usize = 3;
pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_POST_LENGTH: usize = 5000;

pub const DEFAULT_TOKEN_EXPIRE_MINUTES: i64 = 30;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:80";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SECRET_KEY must be set to a non-empty value")]
    MissingSecret,
    #[error("unsupported ALGORITHM '{0}', expected one of HS256, HS384, HS512")]
    UnsupportedAlgorithm(String),
    #[error("ACCESS_TOKEN_EXPIRE_MINUTES must be a positive integer, got '{0}'")]
    InvalidExpiry(String),
}

/// Token signing settings. Loaded once at startup and never mutated.
#[derive(Clone)]
pub struct AuthConfig {
    pub secret_key: String,
    pub algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
}

impl AuthConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            algorithm: Algorithm::HS256,
            access_token_expire_minutes: DEFAULT_TOKEN_EXPIRE_MINUTES,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret_key = lookup("SECRET_KEY")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        let algorithm = match lookup("ALGORITHM") {
            Some(name) => parse_algorithm(&name)?,
            None => Algorithm::HS256,
        };

        let access_token_expire_minutes = match lookup("ACCESS_TOKEN_EXPIRE_MINUTES") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|minutes| *minutes > 0)
                .ok_or(ConfigError::InvalidExpiry(raw))?,
            None => DEFAULT_TOKEN_EXPIRE_MINUTES,
        };

        Ok(Self {
            secret_key,
            algorithm,
            access_token_expire_minutes,
        })
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.access_token_expire_minutes)
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("algorithm", &self.algorithm)
            .field("access_token_expire_minutes", &self.access_token_expire_minutes)
            .finish()
    }
}

// The signing secret is symmetric, so only the HMAC family makes sense.
fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    match Algorithm::from_str(name.trim()) {
        Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
        _ => Err(ConfigError::UnsupportedAlgorithm(name.to_string())),
    }
}

pub fn bind_addr() -> String {
    std::env::var("SOCIAL_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
}
