use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use spin_sdk::http::{Request, Response};
use thiserror::Error;

use crate::config::AuthConfig;
use crate::core::errors::ApiError;
use crate::core::form::{get_string, parse_form};
use crate::core::helpers::{bearer_token, header_str, json_response, parse_json_body, verify_password};
use crate::core::store::SocialStore;
use crate::models::models::{LoginRequest, TokenClaims, TokenResponse, User};
use crate::state::AppState;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, malformed token or expired token. Callers cannot tell
    /// these apart.
    #[error("invalid token")]
    Invalid,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Issues and validates signed, time-limited bearer tokens.
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(config.algorithm);
        // Expiry is checked in validate_at against `exp_micros`, with no leeway.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            algorithm: config.algorithm,
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(subject, ttl, Utc::now())
    }

    fn issue_at(&self, subject: &str, ttl: Duration, now: DateTime<Utc>) -> Result<String, TokenError> {
        let expires = now + ttl;
        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires.timestamp() + i64::from(expires.timestamp_subsec_nanos() > 0),
            exp_micros: expires.timestamp_micros(),
        };
        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Returns the token's subject.
    pub fn validate(&self, token: &str) -> Result<String, TokenError> {
        self.validate_at(token, Utc::now())
    }

    fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(reason = %e, "token rejected");
            TokenError::Invalid
        })?;

        if now.timestamp_micros() >= data.claims.exp_micros {
            tracing::debug!("token rejected: expired");
            return Err(TokenError::Invalid);
        }
        if data.claims.sub.is_empty() {
            tracing::debug!("token rejected: empty subject");
            return Err(TokenError::Invalid);
        }
        Ok(data.claims.sub)
    }
}

/// Maps a validated subject to its stored user. `None` means unauthenticated.
pub fn resolve_identity(store: &dyn SocialStore, subject: &str) -> anyhow::Result<Option<User>> {
    store.find_user_by_username(subject)
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid authentication credentials")
}

pub fn current_user(req: &Request, state: &AppState) -> Result<User, ApiError> {
    let token = bearer_token(req).ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;
    let subject = state
        .tokens()
        .validate(token)
        .map_err(|_| invalid_credentials())?;

    resolve_identity(state.store(), &subject)?.ok_or_else(|| {
        tracing::debug!(subject = %subject, "token subject has no user");
        invalid_credentials()
    })
}

pub fn login(
    store: &dyn SocialStore,
    tokens: &TokenService,
    ttl: Duration,
    credentials: &LoginRequest,
) -> Result<TokenResponse, ApiError> {
    let user = match store.find_user_by_username(&credentials.username)? {
        Some(u) if verify_password(&credentials.password, &u.password_hash) => u,
        _ => {
            tracing::info!("login rejected");
            return Err(ApiError::bad_request("Incorrect username or password"));
        }
    };

    let access_token = tokens
        .issue(&user.username, ttl)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    tracing::info!(user_id = user.id, "login succeeded");

    Ok(TokenResponse {
        access_token,
        token_type: "bearer",
    })
}

// Accepts the OAuth2 password form as well as a JSON body.
fn read_credentials(req: &Request) -> Result<LoginRequest, ApiError> {
    let content_type = header_str(req, "content-type").unwrap_or_default();
    if !content_type.starts_with("application/x-www-form-urlencoded") {
        return parse_json_body(req);
    }

    let body = std::str::from_utf8(req.body())
        .map_err(|_| ApiError::unprocessable("Request body must be UTF-8"))?;
    let params = parse_form(body);
    match (get_string(&params, "username"), get_string(&params, "password")) {
        (Some(username), Some(password)) => Ok(LoginRequest { username, password }),
        _ => Err(ApiError::unprocessable("username and password are required")),
    }
}

pub fn handle_login(req: &Request, state: &AppState) -> Result<Response, ApiError> {
    let credentials = read_credentials(req)?;
    let token = login(state.store(), state.tokens(), state.token_ttl(), &credentials)?;
    json_response(200, &token)
}
