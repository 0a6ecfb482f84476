use spin_sdk::http::{Request, Response};

use crate::auth::current_user;
use crate::config::*;
use crate::core::errors::ApiError;
use crate::core::helpers::{json_response, parse_json_body};
use crate::core::store::SocialStore;
use crate::guard::{authorize_owner, require_post};
use crate::models::models::{MessageResponse, Post, PostInput, User};
use crate::state::AppState;

fn validate_post_input(input: &PostInput) -> Result<(), ApiError> {
    if input.title.trim().is_empty() || input.title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ApiError::unprocessable("Invalid title"));
    }
    if input.content.trim().is_empty() || input.content.chars().count() > MAX_POST_LENGTH {
        return Err(ApiError::unprocessable("Invalid content"));
    }
    Ok(())
}

pub fn create_post(store: &dyn SocialStore, user: &User, input: &PostInput) -> Result<Post, ApiError> {
    validate_post_input(input)?;
    let record = store.insert_post(user.id, input)?;
    tracing::info!(post_id = record.id, user_id = user.id, "post created");
    Ok(Post::from_record(record, 0))
}

pub fn list_posts(store: &dyn SocialStore) -> Result<Vec<Post>, ApiError> {
    Ok(store.list_posts()?)
}

pub fn get_post(store: &dyn SocialStore, post_id: i64) -> Result<Post, ApiError> {
    store
        .get_post(post_id)?
        .ok_or_else(|| ApiError::not_found("Post not found"))
}

pub fn update_post(
    store: &dyn SocialStore,
    post_id: i64,
    user: &User,
    input: &PostInput,
) -> Result<Post, ApiError> {
    validate_post_input(input)?;

    let post = require_post(store.find_post(post_id)?)?;
    authorize_owner(&post, user)?;

    // The post can vanish between the lookup and the write.
    require_post(store.update_post(post_id, input)?)?;
    tracing::info!(post_id, user_id = user.id, "post updated");
    get_post(store, post_id)
}

pub fn delete_post(store: &dyn SocialStore, post_id: i64, user: &User) -> Result<(), ApiError> {
    let post = require_post(store.find_post(post_id)?)?;
    authorize_owner(&post, user)?;

    if !store.delete_post(post_id)? {
        return Err(ApiError::not_found("Post not found"));
    }
    tracing::info!(post_id, user_id = user.id, "post deleted");
    Ok(())
}

// === HTTP Handlers ===

pub fn handle_create_post(req: &Request, state: &AppState) -> Result<Response, ApiError> {
    let user = current_user(req, state)?;
    let input: PostInput = parse_json_body(req)?;
    json_response(200, &create_post(state.store(), &user, &input)?)
}

pub fn handle_list_posts(state: &AppState) -> Result<Response, ApiError> {
    json_response(200, &list_posts(state.store())?)
}

pub fn handle_get_post(state: &AppState, post_id: i64) -> Result<Response, ApiError> {
    json_response(200, &get_post(state.store(), post_id)?)
}

pub fn handle_update_post(req: &Request, state: &AppState, post_id: i64) -> Result<Response, ApiError> {
    let user = current_user(req, state)?;
    let input: PostInput = parse_json_body(req)?;
    json_response(200, &update_post(state.store(), post_id, &user, &input)?)
}

pub fn handle_delete_post(req: &Request, state: &AppState, post_id: i64) -> Result<Response, ApiError> {
    let user = current_user(req, state)?;
    delete_post(state.store(), post_id, &user)?;
    json_response(
        200,
        &MessageResponse {
            message: "Post deleted successfully",
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory_store::MemoryStore;
    use crate::models::models::NewUser;

    fn add_user(store: &MemoryStore, name: &str) -> User {
        store
            .insert_user(&NewUser {
                username: name.to_string(),
                email: format!("{name}@x.com"),
                password_hash: "hash".to_string(),
            })
            .unwrap()
            .unwrap()
    }

    fn input(title: &str, content: &str) -> PostInput {
        PostInput {
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_create_post_starts_with_zero_likes() {
        let store = MemoryStore::new();
        let alice = add_user(&store, "alice");
        let post = create_post(&store, &alice, &input("Hello", "First post")).unwrap();
        assert_eq!(post.user_id, alice.id);
        assert_eq!(post.likes, 0);
        assert_eq!(get_post(&store, post.id).unwrap(), post);
    }

    #[test]
    fn test_only_owner_may_update_or_delete() {
        let store = MemoryStore::new();
        let alice = add_user(&store, "alice");
        let bob = add_user(&store, "bob");
        let post = create_post(&store, &alice, &input("Hello", "First post")).unwrap();

        let update = update_post(&store, post.id, &bob, &input("Mine", "now"));
        assert!(matches!(update, Err(ApiError::Forbidden(_))));
        assert!(matches!(delete_post(&store, post.id, &bob), Err(ApiError::Forbidden(_))));

        let updated = update_post(&store, post.id, &alice, &input("Edited", "changed")).unwrap();
        assert_eq!(updated.title, "Edited");
        assert_eq!(updated.content, "changed");

        delete_post(&store, post.id, &alice).unwrap();
        assert!(matches!(get_post(&store, post.id), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_missing_post_is_not_found_before_ownership() {
        let store = MemoryStore::new();
        let bob = add_user(&store, "bob");
        assert!(matches!(
            update_post(&store, 404, &bob, &input("a", "b")),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(delete_post(&store, 404, &bob), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_update_keeps_like_count() {
        let store = MemoryStore::new();
        let alice = add_user(&store, "alice");
        let bob = add_user(&store, "bob");
        let post = create_post(&store, &alice, &input("Hello", "First post")).unwrap();
        store.insert_like(bob.id, post.id).unwrap();

        let updated = update_post(&store, post.id, &alice, &input("Edited", "changed")).unwrap();
        assert_eq!(updated.likes, 1);
    }

    #[test]
    fn test_post_input_validation() {
        let store = MemoryStore::new();
        let alice = add_user(&store, "alice");
        let long = "a".repeat(MAX_POST_LENGTH + 1);
        for bad in [input("", "body"), input("title", ""), input("title", &long)] {
            assert!(matches!(
                create_post(&store, &alice, &bad),
                Err(ApiError::UnprocessableEntity(_))
            ));
        }
        assert!(list_posts(&store).unwrap().is_empty());
    }
}
