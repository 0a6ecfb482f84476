use spin_sdk::http::{Request, Response};
use uuid::Uuid;

use crate::config::API_PREFIX;
use crate::core::errors::ApiError;
use crate::core::helpers::{json_response, parse_post_id};
use crate::models::models::MessageResponse;
use crate::state::AppState;
use crate::{auth, likes, posts, users};

/// Entry point shared by the Spin component and the native server.
pub fn route(req: &Request, state: &AppState) -> Response {
    let method = req.method().to_string();
    let path = req.path().split('?').next().unwrap_or_default().to_string();

    let span = tracing::info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %method,
        path = %path,
    );
    let _enter = span.enter();

    let response = dispatch(&method, &path, req, state).unwrap_or_else(Response::from);
    tracing::info!(status = *response.status(), "request completed");
    response
}

fn dispatch(method: &str, path: &str, req: &Request, state: &AppState) -> Result<Response, ApiError> {
    let rest = path
        .strip_prefix(API_PREFIX)
        .filter(|rest| rest.is_empty() || rest.starts_with('/'))
        .ok_or_else(|| ApiError::not_found("Not Found"))?;
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

    match (method, segments.as_slice()) {
        ("POST", ["signup"]) => users::handle_signup(req, state.store()),
        ("POST", ["login"]) => auth::handle_login(req, state),
        ("GET", ["docs"]) => json_response(
            200,
            &MessageResponse {
                message: "API documentation",
            },
        ),
        ("POST", ["posts"]) => posts::handle_create_post(req, state),
        ("GET", ["posts"]) => posts::handle_list_posts(state),
        ("GET", ["posts", id]) => posts::handle_get_post(state, parse_post_id(id)?),
        ("PUT", ["posts", id]) => posts::handle_update_post(req, state, parse_post_id(id)?),
        ("DELETE", ["posts", id]) => posts::handle_delete_post(req, state, parse_post_id(id)?),
        ("POST", ["posts", id, "like"]) => likes::handle_like(req, state, parse_post_id(id)?),
        ("POST", ["posts", id, "dislike"]) => likes::handle_dislike(req, state, parse_post_id(id)?),
        (_, ["signup"] | ["login"] | ["docs"] | ["posts"] | ["posts", _])
        | (_, ["posts", _, "like" | "dislike"]) => Err(ApiError::MethodNotAllowed),
        _ => Err(ApiError::not_found("Not Found")),
    }
}
