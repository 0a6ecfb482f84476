use spin_sdk::sqlite::{Connection, QueryResult, Value};

use crate::core::helpers::now_iso;
use crate::core::store::SocialStore;
use crate::models::models::{NewUser, Post, PostInput, PostRecord, User};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS likes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        post_id INTEGER NOT NULL REFERENCES posts(id),
        UNIQUE (user_id, post_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_likes_post_id ON likes (post_id)",
];

const POST_WITH_LIKES: &str = "SELECT p.id, p.user_id, p.title, p.content, COUNT(l.id) AS likes
    FROM posts p LEFT JOIN likes l ON l.post_id = p.id";

/// Runs SQL statements on one open connection.
pub trait Executor {
    fn execute(&self, statement: &str, params: &[Value]) -> anyhow::Result<QueryResult>;
}

/// Hands out connections to the database backing a `SqliteStore`.
pub trait Database: Send + Sync {
    type Conn: Executor;

    fn connect(&self) -> anyhow::Result<Self::Conn>;
}

/// The Spin component's default SQLite database.
pub struct SpinDatabase;

impl Database for SpinDatabase {
    type Conn = Connection;

    fn connect(&self) -> anyhow::Result<Connection> {
        Ok(Connection::open_default()?)
    }
}

impl Executor for Connection {
    fn execute(&self, statement: &str, params: &[Value]) -> anyhow::Result<QueryResult> {
        Ok(Connection::execute(self, statement, params)?)
    }
}

/// SQL backed store. Opens a connection for each operation.
pub struct SqliteStore<D: Database = SpinDatabase> {
    db: D,
}

impl SqliteStore {
    /// Opens the Spin default database and creates the schema if needed.
    pub fn open() -> anyhow::Result<Self> {
        Self::with_database(SpinDatabase)
    }
}

impl<D: Database> SqliteStore<D> {
    pub fn with_database(db: D) -> anyhow::Result<Self> {
        let conn = db.connect()?;
        for statement in SCHEMA {
            conn.execute(statement, &[])?;
        }
        Ok(Self { db })
    }

    fn connection(&self) -> anyhow::Result<D::Conn> {
        self.db.connect()
    }
}

/// One result row with its column names.
struct Record<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Record<'a> {
    fn value(&self, column: &str) -> anyhow::Result<&'a Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
            .ok_or_else(|| anyhow::anyhow!("missing column '{}'", column))
    }

    fn integer(&self, column: &str) -> anyhow::Result<i64> {
        match self.value(column)? {
            Value::Integer(i) => Ok(*i),
            _ => Err(anyhow::anyhow!("column '{}' is not an integer", column)),
        }
    }

    fn text(&self, column: &str) -> anyhow::Result<String> {
        match self.value(column)? {
            Value::Text(s) => Ok(s.clone()),
            _ => Err(anyhow::anyhow!("column '{}' is not text", column)),
        }
    }
}

fn records(result: &QueryResult) -> impl Iterator<Item = Record<'_>> {
    result.rows.iter().map(|row| Record {
        columns: &result.columns,
        values: &row.values,
    })
}

fn user_from_row(row: &Record<'_>) -> anyhow::Result<User> {
    Ok(User {
        id: row.integer("id")?,
        username: row.text("username")?,
        email: row.text("email")?,
        password_hash: row.text("password_hash")?,
        created_at: row.text("created_at")?,
    })
}

fn record_from_row(row: &Record<'_>) -> anyhow::Result<PostRecord> {
    Ok(PostRecord {
        id: row.integer("id")?,
        user_id: row.integer("user_id")?,
        title: row.text("title")?,
        content: row.text("content")?,
        created_at: row.text("created_at")?,
    })
}

fn post_from_row(row: &Record<'_>) -> anyhow::Result<Post> {
    Ok(Post {
        id: row.integer("id")?,
        user_id: row.integer("user_id")?,
        title: row.text("title")?,
        content: row.text("content")?,
        likes: row.integer("likes")?,
    })
}

fn first<T>(
    result: &QueryResult,
    map: impl Fn(&Record<'_>) -> anyhow::Result<T>,
) -> anyhow::Result<Option<T>> {
    records(result).next().map(|row| map(&row)).transpose()
}

impl<D: Database> SocialStore for SqliteStore<D> {
    fn insert_user(&self, new_user: &NewUser) -> anyhow::Result<Option<User>> {
        let result = self.connection()?.execute(
            "INSERT INTO users (username, email, password_hash, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT DO NOTHING
             RETURNING id, username, email, password_hash, created_at",
            &[
                Value::Text(new_user.username.clone()),
                Value::Text(new_user.email.clone()),
                Value::Text(new_user.password_hash.clone()),
                Value::Text(now_iso()),
            ],
        )?;
        first(&result, user_from_row)
    }

    fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let result = self.connection()?.execute(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = ?",
            &[Value::Text(username.to_string())],
        )?;
        first(&result, user_from_row)
    }

    fn insert_post(&self, user_id: i64, input: &PostInput) -> anyhow::Result<PostRecord> {
        let result = self.connection()?.execute(
            "INSERT INTO posts (user_id, title, content, created_at) VALUES (?, ?, ?, ?)
             RETURNING id, user_id, title, content, created_at",
            &[
                Value::Integer(user_id),
                Value::Text(input.title.clone()),
                Value::Text(input.content.clone()),
                Value::Text(now_iso()),
            ],
        )?;
        first(&result, record_from_row)?
            .ok_or_else(|| anyhow::anyhow!("insert into posts returned no row"))
    }

    fn find_post(&self, post_id: i64) -> anyhow::Result<Option<PostRecord>> {
        let result = self.connection()?.execute(
            "SELECT id, user_id, title, content, created_at FROM posts WHERE id = ?",
            &[Value::Integer(post_id)],
        )?;
        first(&result, record_from_row)
    }

    fn get_post(&self, post_id: i64) -> anyhow::Result<Option<Post>> {
        let query = format!("{POST_WITH_LIKES} WHERE p.id = ? GROUP BY p.id");
        let result = self.connection()?.execute(&query, &[Value::Integer(post_id)])?;
        first(&result, post_from_row)
    }

    fn list_posts(&self) -> anyhow::Result<Vec<Post>> {
        let query = format!("{POST_WITH_LIKES} GROUP BY p.id ORDER BY p.id");
        let result = self.connection()?.execute(&query, &[])?;
        records(&result).map(|row| post_from_row(&row)).collect()
    }

    fn update_post(&self, post_id: i64, input: &PostInput) -> anyhow::Result<Option<PostRecord>> {
        let result = self.connection()?.execute(
            "UPDATE posts SET title = ?, content = ? WHERE id = ?
             RETURNING id, user_id, title, content, created_at",
            &[
                Value::Text(input.title.clone()),
                Value::Text(input.content.clone()),
                Value::Integer(post_id),
            ],
        )?;
        first(&result, record_from_row)
    }

    fn delete_post(&self, post_id: i64) -> anyhow::Result<bool> {
        let conn = self.connection()?;
        conn.execute("BEGIN", &[])?;
        let outcome = (|| -> anyhow::Result<bool> {
            conn.execute("DELETE FROM likes WHERE post_id = ?", &[Value::Integer(post_id)])?;
            let deleted = conn.execute(
                "DELETE FROM posts WHERE id = ? RETURNING id",
                &[Value::Integer(post_id)],
            )?;
            Ok(!deleted.rows.is_empty())
        })();
        match outcome {
            Ok(deleted) => {
                conn.execute("COMMIT", &[])?;
                Ok(deleted)
            }
            Err(e) => {
                conn.execute("ROLLBACK", &[])?;
                Err(e)
            }
        }
    }

    fn insert_like(&self, user_id: i64, post_id: i64) -> anyhow::Result<bool> {
        let result = self.connection()?.execute(
            "INSERT INTO likes (user_id, post_id) VALUES (?, ?)
             ON CONFLICT (user_id, post_id) DO NOTHING
             RETURNING id",
            &[Value::Integer(user_id), Value::Integer(post_id)],
        )?;
        Ok(!result.rows.is_empty())
    }

    fn delete_like(&self, user_id: i64, post_id: i64) -> anyhow::Result<bool> {
        let result = self.connection()?.execute(
            "DELETE FROM likes WHERE user_id = ? AND post_id = ? RETURNING id",
            &[Value::Integer(user_id), Value::Integer(post_id)],
        )?;
        Ok(!result.rows.is_empty())
    }
}
