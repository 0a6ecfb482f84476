//! Ownership rules for mutating operations.
//!
//! Callers apply the checks in a fixed order: the post must exist, then the
//! ownership / self-reaction rule, then the like duplicate/absence check,
//! and only then the mutation.

use crate::core::errors::ApiError;
use crate::models::models::{PostRecord, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Like,
    Dislike,
}

pub fn require_post(post: Option<PostRecord>) -> Result<PostRecord, ApiError> {
    post.ok_or_else(|| ApiError::not_found("Post not found"))
}

/// Only the creator may edit or delete a post.
pub fn authorize_owner(post: &PostRecord, user: &User) -> Result<(), ApiError> {
    if post.user_id != user.id {
        tracing::info!(post_id = post.id, user_id = user.id, "post mutation denied");
        return Err(ApiError::forbidden("Permission denied"));
    }
    Ok(())
}

/// Nobody may like or dislike their own post.
pub fn authorize_reaction(post: &PostRecord, user: &User, reaction: Reaction) -> Result<(), ApiError> {
    if post.user_id == user.id {
        let msg = match reaction {
            Reaction::Like => "Cannot like your own post",
            Reaction::Dislike => "Cannot dislike your own post",
        };
        return Err(ApiError::bad_request(msg));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64) -> User {
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@x.com"),
            password_hash: String::new(),
            created_at: String::new(),
        }
    }

    fn post_owned_by(user_id: i64) -> PostRecord {
        PostRecord {
            id: 7,
            user_id,
            title: "t".to_string(),
            content: "c".to_string(),
            created_at: String::new(),
        }
    }

    #[test]
    fn test_missing_post_is_not_found() {
        assert!(matches!(require_post(None), Err(ApiError::NotFound(_))));
        assert_eq!(require_post(Some(post_owned_by(1))).unwrap().id, 7);
    }

    #[test]
    fn test_owner_rule() {
        let post = post_owned_by(1);
        assert!(authorize_owner(&post, &user(1)).is_ok());
        assert!(matches!(authorize_owner(&post, &user(2)), Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn test_self_reaction_rule() {
        let post = post_owned_by(1);
        for reaction in [Reaction::Like, Reaction::Dislike] {
            assert!(matches!(
                authorize_reaction(&post, &user(1), reaction),
                Err(ApiError::BadRequest(_))
            ));
            assert!(authorize_reaction(&post, &user(2), reaction).is_ok());
        }
    }
}
