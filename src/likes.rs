use spin_sdk::http::{Request, Response};

use crate::auth::current_user;
use crate::core::errors::ApiError;
use crate::core::helpers::json_response;
use crate::core::store::SocialStore;
use crate::guard::{authorize_reaction, require_post, Reaction};
use crate::models::models::{MessageResponse, User};
use crate::state::AppState;

pub fn like_post(store: &dyn SocialStore, post_id: i64, user: &User) -> Result<(), ApiError> {
    let post = require_post(store.find_post(post_id)?)?;
    authorize_reaction(&post, user, Reaction::Like)?;

    // Single insert-or-conflict; the store enforces (user, post) uniqueness.
    if !store.insert_like(user.id, post_id)? {
        return Err(ApiError::conflict("You already liked this post"));
    }
    tracing::info!(post_id, user_id = user.id, "post liked");
    Ok(())
}

pub fn dislike_post(store: &dyn SocialStore, post_id: i64, user: &User) -> Result<(), ApiError> {
    let post = require_post(store.find_post(post_id)?)?;
    authorize_reaction(&post, user, Reaction::Dislike)?;

    if !store.delete_like(user.id, post_id)? {
        return Err(ApiError::conflict("You have not liked this post"));
    }
    tracing::info!(post_id, user_id = user.id, "post disliked");
    Ok(())
}

// === HTTP Handlers ===

pub fn handle_like(req: &Request, state: &AppState, post_id: i64) -> Result<Response, ApiError> {
    let user = current_user(req, state)?;
    like_post(state.store(), post_id, &user)?;
    json_response(
        200,
        &MessageResponse {
            message: "Post liked successfully",
        },
    )
}

pub fn handle_dislike(req: &Request, state: &AppState, post_id: i64) -> Result<Response, ApiError> {
    let user = current_user(req, state)?;
    dislike_post(state.store(), post_id, &user)?;
    json_response(
        200,
        &MessageResponse {
            message: "Post disliked successfully",
        },
    )
}
