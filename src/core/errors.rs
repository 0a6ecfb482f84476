use http::StatusCode;
use spin_sdk::http::Response;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unprocessable Entity: {0}")]
    UnprocessableEntity(String),
    #[error("Internal Error: {0}")]
    InternalError(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        ApiError::UnprocessableEntity(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Internal details stay in the logs.
    pub fn detail(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::UnprocessableEntity(msg) => msg,
            ApiError::MethodNotAllowed => "Method Not Allowed",
            ApiError::InternalError(_) => "Internal server error",
        }
    }
}

impl From<ApiError> for Response {
    fn from(err: ApiError) -> Self {
        if let ApiError::InternalError(msg) = &err {
            tracing::error!(error = %msg, "request failed");
        }

        let body = serde_json::json!({ "detail": err.detail() }).to_string();
        let mut builder = Response::builder();
        builder
            .status(err.status_code().as_u16())
            .header("content-type", "application/json");
        if matches!(err, ApiError::Unauthorized(_)) {
            builder.header("www-authenticate", "Bearer");
        }
        builder.body(body.into_bytes()).build()
    }
}

// Storage and infrastructure failures surface as internal errors.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(format!("{err:#}"))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_json(resp: &Response) -> serde_json::Value {
        serde_json::from_slice(resp.body()).unwrap()
    }

    #[test]
    fn test_conflict_maps_to_409_with_detail() {
        let resp: Response = ApiError::conflict("User already exist").into();
        assert_eq!(*resp.status(), 409);
        assert_eq!(body_json(&resp)["detail"], "User already exist");
    }

    #[test]
    fn test_internal_error_hides_details() {
        let err: ApiError = anyhow::anyhow!("disk on fire").into();
        let resp: Response = err.into();
        assert_eq!(*resp.status(), 500);
        assert_eq!(body_json(&resp)["detail"], "Internal server error");
    }

    #[test]
    fn test_unauthorized_carries_bearer_challenge() {
        let resp: Response = ApiError::unauthorized("Not authenticated").into();
        assert_eq!(*resp.status(), 401);
        let challenge = resp
            .header("www-authenticate")
            .and_then(|h| h.as_str())
            .unwrap();
        assert_eq!(challenge, "Bearer");
    }
}
