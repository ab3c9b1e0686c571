//! User repository for database operations
//!
//! This is the credential store behind the authentication gate. Hashing
//! happens before a row reaches it; the repository only ever sees hashes.

use common::error::{DatabaseError, DatabaseResult};
use sqlx::SqlitePool;
use tracing::info;

use crate::models::User;

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new user and return the id assigned by the store
    ///
    /// A taken username fails with `DatabaseError::UniqueViolation` and
    /// leaves the table untouched.
    pub async fn insert(&self, username: &str, password_hash: &str) -> DatabaseResult<i64> {
        info!("Creating new user: {}", username);

        let result = sqlx::query("INSERT INTO user (username, password_hash) VALUES (?, ?)")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok(result.last_insert_rowid())
    }

    /// Find a user by exact username
    pub async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        info!("Finding user by username: {}", username);

        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash
            FROM user
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash
            FROM user
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }
}
