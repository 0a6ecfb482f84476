use std::sync::OnceLock;

use regex::Regex;
use spin_sdk::http::{Request, Response};

use crate::config::*;
use crate::core::errors::ApiError;
use crate::core::helpers::{hash_password, json_response, parse_json_body};
use crate::core::store::SocialStore;
use crate::models::models::{NewUser, SignupRequest, User};

fn email_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Regex should compile"))
}

pub fn build_user_json(user: &User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id,
        "username": user.username,
    })
}

fn validate_signup(request: &SignupRequest) -> Result<(), ApiError> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(ApiError::unprocessable("Username is required"));
    }
    let length = username.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&length) {
        return Err(ApiError::unprocessable(format!(
            "Username must be {}-{} characters",
            MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH
        )));
    }
    if request.password.is_empty() {
        return Err(ApiError::unprocessable("Password is required"));
    }
    if request.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::unprocessable(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    if !email_regex().is_match(request.email.trim()) {
        return Err(ApiError::unprocessable("Invalid email address"));
    }
    Ok(())
}

pub fn signup(store: &dyn SocialStore, request: &SignupRequest) -> Result<User, ApiError> {
    validate_signup(request)?;

    let new_user = NewUser {
        username: request.username.trim().to_string(),
        email: request.email.trim().to_string(),
        password_hash: hash_password(&request.password)?,
    };

    match store.insert_user(&new_user)? {
        Some(user) => {
            tracing::info!(user_id = user.id, username = %user.username, "user created");
            Ok(user)
        }
        None => Err(ApiError::conflict("User already exist")),
    }
}

pub fn handle_signup(req: &Request, store: &dyn SocialStore) -> Result<Response, ApiError> {
    let request: SignupRequest = parse_json_body(req)?;
    let user = signup(store, &request)?;
    json_response(200, &build_user_json(&user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::helpers::verify_password;
    use crate::core::memory_store::MemoryStore;

    fn request(username: &str, password: &str, email: &str) -> SignupRequest {
        SignupRequest {
            username: username.to_string(),
            password: password.to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn test_signup_stores_hash_not_password() {
        let store = MemoryStore::new();
        let user = signup(&store, &request("alice", "wonderland", "a@x.com")).unwrap();
        assert_ne!(user.password_hash, "wonderland");
        assert!(verify_password("wonderland", &user.password_hash));

        let json = build_user_json(&user);
        assert_eq!(json["username"], "alice");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("email").is_none());
    }

    #[test]
    fn test_duplicate_signup_conflicts() {
        let store = MemoryStore::new();
        signup(&store, &request("alice", "pw1", "a@x.com")).unwrap();

        let same = signup(&store, &request("alice", "pw1", "a@x.com"));
        assert!(matches!(same, Err(ApiError::Conflict(_))));

        let same_email = signup(&store, &request("alicia", "pw1", "a@x.com"));
        assert!(matches!(same_email, Err(ApiError::Conflict(_))));
    }

    #[test]
    fn test_signup_validation() {
        let store = MemoryStore::new();
        let cases = [
            request("", "secret", "a@x.com"),
            request("al", "secret", "a@x.com"),
            request(&"a".repeat(MAX_USERNAME_LENGTH + 1), "secret", "a@x.com"),
            request("alice", "", "a@x.com"),
            request("alice", "pw", "a@x.com"),
            request("alice", "secret", "not-an-email"),
        ];
        for case in &cases {
            assert!(matches!(signup(&store, case), Err(ApiError::UnprocessableEntity(_))));
        }
    }
}
