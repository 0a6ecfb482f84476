use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use spin_sdk::http::{Request, Response};

use crate::core::errors::ApiError;

pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub fn json_response<T: Serialize>(status: u16, body: &T) -> Result<Response, ApiError> {
    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(serde_json::to_vec(body)?)
        .build())
}

pub fn parse_json_body<T: DeserializeOwned>(req: &Request) -> Result<T, ApiError> {
    serde_json::from_slice(req.body())
        .map_err(|e| ApiError::unprocessable(format!("Invalid request body: {}", e)))
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

/// Returns false for a wrong password and for a hash that does not parse.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

pub fn header_str<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
    req.header(name).and_then(|h| h.as_str())
}

/// Token from an `Authorization: Bearer <token>` header, if present.
pub fn bearer_token(req: &Request) -> Option<&str> {
    let auth_header = header_str(req, "authorization")?;
    let (scheme, token) = auth_header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

pub fn parse_post_id(segment: &str) -> Result<i64, ApiError> {
    segment
        .parse::<i64>()
        .map_err(|_| ApiError::unprocessable("Post ID must be an integer"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spin_sdk::http::Method;

    fn request_with_auth(value: &str) -> Request {
        Request::builder()
            .method(Method::Get)
            .uri("/social/posts")
            .header("authorization", value)
            .body(Vec::new())
            .build()
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct-horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct-horse", &hash));
        assert!(!verify_password("correct-hors", &hash));
        assert!(!verify_password("", &hash));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let first = hash_password("same").unwrap();
        let second = hash_password("same").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("same", &first));
        assert!(verify_password("same", &second));
    }

    #[test]
    fn test_malformed_hash_verifies_false() {
        assert!(!verify_password("password", "not-a-valid-hash"));
        assert!(!verify_password("password", ""));
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&request_with_auth("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&request_with_auth("bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&request_with_auth("Basic abc")), None);
        assert_eq!(bearer_token(&request_with_auth("Bearer ")), None);
        assert_eq!(bearer_token(&request_with_auth("abc.def")), None);
    }

    #[test]
    fn test_parse_post_id() {
        assert_eq!(parse_post_id("42").unwrap(), 42);
        assert!(matches!(parse_post_id("abc"), Err(ApiError::UnprocessableEntity(_))));
    }
}
