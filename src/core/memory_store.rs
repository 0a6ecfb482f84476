use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use crate::core::helpers::now_iso;
use crate::core::store::SocialStore;
use crate::models::models::{NewUser, Post, PostInput, PostRecord, User};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    posts: BTreeMap<i64, PostRecord>,
    // (post_id, user_id), so one post's likes are a contiguous range.
    likes: BTreeSet<(i64, i64)>,
    next_user_id: i64,
    next_post_id: i64,
}

impl Tables {
    fn like_count(&self, post_id: i64) -> i64 {
        self.likes.range((post_id, i64::MIN)..=(post_id, i64::MAX)).count() as i64
    }
}

/// In-process store used by the native server and the tests.
///
/// All tables sit behind one mutex, so every trait operation is atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> anyhow::Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))
    }
}

impl SocialStore for MemoryStore {
    fn insert_user(&self, new_user: &NewUser) -> anyhow::Result<Option<User>> {
        let mut tables = self.tables()?;
        let taken = tables
            .users
            .values()
            .any(|u| u.username == new_user.username || u.email == new_user.email);
        if taken {
            return Ok(None);
        }

        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            created_at: now_iso(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(Some(user))
    }

    fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let tables = self.tables()?;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    fn insert_post(&self, user_id: i64, input: &PostInput) -> anyhow::Result<PostRecord> {
        let mut tables = self.tables()?;
        tables.next_post_id += 1;
        let post = PostRecord {
            id: tables.next_post_id,
            user_id,
            title: input.title.clone(),
            content: input.content.clone(),
            created_at: now_iso(),
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    fn find_post(&self, post_id: i64) -> anyhow::Result<Option<PostRecord>> {
        Ok(self.tables()?.posts.get(&post_id).cloned())
    }

    fn get_post(&self, post_id: i64) -> anyhow::Result<Option<Post>> {
        let tables = self.tables()?;
        Ok(tables
            .posts
            .get(&post_id)
            .cloned()
            .map(|record| Post::from_record(record, tables.like_count(post_id))))
    }

    fn list_posts(&self) -> anyhow::Result<Vec<Post>> {
        let tables = self.tables()?;
        Ok(tables
            .posts
            .values()
            .map(|record| Post::from_record(record.clone(), tables.like_count(record.id)))
            .collect())
    }

    fn update_post(&self, post_id: i64, input: &PostInput) -> anyhow::Result<Option<PostRecord>> {
        let mut tables = self.tables()?;
        Ok(tables.posts.get_mut(&post_id).map(|post| {
            post.title = input.title.clone();
            post.content = input.content.clone();
            post.clone()
        }))
    }

    fn delete_post(&self, post_id: i64) -> anyhow::Result<bool> {
        let mut tables = self.tables()?;
        if tables.posts.remove(&post_id).is_none() {
            return Ok(false);
        }
        tables.likes.retain(|(p, _)| *p != post_id);
        Ok(true)
    }

    fn insert_like(&self, user_id: i64, post_id: i64) -> anyhow::Result<bool> {
        Ok(self.tables()?.likes.insert((post_id, user_id)))
    }

    fn delete_like(&self, user_id: i64, post_id: i64) -> anyhow::Result<bool> {
        Ok(self.tables()?.likes.remove(&(post_id, user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn input(title: &str) -> PostInput {
        PostInput {
            title: title.to_string(),
            content: "body".to_string(),
        }
    }

    #[test]
    fn test_username_and_email_are_unique() {
        let store = MemoryStore::new();
        assert!(store.insert_user(&new_user("alice", "a@x.com")).unwrap().is_some());
        assert!(store.insert_user(&new_user("alice", "other@x.com")).unwrap().is_none());
        assert!(store.insert_user(&new_user("bob", "a@x.com")).unwrap().is_none());
        assert!(store.insert_user(&new_user("bob", "b@x.com")).unwrap().is_some());
    }

    #[test]
    fn test_like_counts_default_to_zero() {
        let store = MemoryStore::new();
        let post = store.insert_post(1, &input("first")).unwrap();
        assert_eq!(store.get_post(post.id).unwrap().unwrap().likes, 0);

        for user_id in 10..13 {
            assert!(store.insert_like(user_id, post.id).unwrap());
        }
        assert_eq!(store.get_post(post.id).unwrap().unwrap().likes, 3);

        let listed = store.list_posts().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].likes, 3);
    }

    #[test]
    fn test_like_counts_are_per_post() {
        let store = MemoryStore::new();
        let first = store.insert_post(1, &input("first")).unwrap();
        let second = store.insert_post(1, &input("second")).unwrap();
        store.insert_like(2, first.id).unwrap();
        store.insert_like(3, first.id).unwrap();
        store.insert_like(2, second.id).unwrap();

        let likes: Vec<_> = store.list_posts().unwrap().iter().map(|p| (p.id, p.likes)).collect();
        assert_eq!(likes, vec![(first.id, 2), (second.id, 1)]);
    }

    #[test]
    fn test_like_is_unique_per_user_and_post() {
        let store = MemoryStore::new();
        assert!(store.insert_like(2, 1).unwrap());
        assert!(!store.insert_like(2, 1).unwrap());
        assert!(store.delete_like(2, 1).unwrap());
        assert!(!store.delete_like(2, 1).unwrap());
    }

    #[test]
    fn test_concurrent_likes_store_exactly_one_row() {
        let store = Arc::new(MemoryStore::new());
        let post = store.insert_post(1, &input("popular")).unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.insert_like(2, post.id).unwrap())
            })
            .collect();
        let inserted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|inserted| *inserted)
            .count();

        assert_eq!(inserted, 1);
        assert_eq!(store.get_post(post.id).unwrap().unwrap().likes, 1);
    }

    #[test]
    fn test_delete_post_removes_its_likes() {
        let store = MemoryStore::new();
        let post = store.insert_post(1, &input("doomed")).unwrap();
        store.insert_like(2, post.id).unwrap();

        assert!(store.delete_post(post.id).unwrap());
        assert!(!store.delete_post(post.id).unwrap());
        assert!(store.find_post(post.id).unwrap().is_none());
        // A fresh like on the same pair must not collide with a stale row.
        assert!(store.insert_like(2, post.id).unwrap());
    }

    #[test]
    fn test_update_missing_post_returns_none() {
        let store = MemoryStore::new();
        assert!(store.update_post(99, &input("nope")).unwrap().is_none());
    }
}
