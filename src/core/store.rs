//! Persistence seam.
//!
//! Every function takes plain ids and returns plain records. Uniqueness of
//! usernames, emails and (user, post) likes is enforced by the store itself:
//! `insert_user` and `insert_like` are single atomic insert-or-conflict
//! operations, never a separate lookup followed by an insert.

use crate::models::models::{NewUser, Post, PostInput, PostRecord, User};

pub trait SocialStore: Send + Sync {
    /// Returns `None` when the username or email is already taken.
    fn insert_user(&self, new_user: &NewUser) -> anyhow::Result<Option<User>>;

    fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;

    fn insert_post(&self, user_id: i64, input: &PostInput) -> anyhow::Result<PostRecord>;

    fn find_post(&self, post_id: i64) -> anyhow::Result<Option<PostRecord>>;

    /// Post with its like count (0 when it has none).
    fn get_post(&self, post_id: i64) -> anyhow::Result<Option<Post>>;

    /// All posts with like counts, ordered by id.
    fn list_posts(&self) -> anyhow::Result<Vec<Post>>;

    fn update_post(&self, post_id: i64, input: &PostInput) -> anyhow::Result<Option<PostRecord>>;

    /// Removes the post and its likes. Returns false when it did not exist.
    fn delete_post(&self, post_id: i64) -> anyhow::Result<bool>;

    /// Returns false when the (user, post) like already exists.
    fn insert_like(&self, user_id: i64, post_id: i64) -> anyhow::Result<bool>;

    /// Returns false when there was no like to remove.
    fn delete_like(&self, user_id: i64, post_id: i64) -> anyhow::Result<bool>;
}
