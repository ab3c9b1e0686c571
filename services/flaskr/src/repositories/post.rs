//! Post repository for database operations

use common::error::{DatabaseError, DatabaseResult};
use sqlx::SqlitePool;
use tracing::info;

use crate::models::Post;

/// Post repository
#[derive(Clone)]
pub struct PostRepository {
    pool: SqlitePool,
}

impl PostRepository {
    /// Create a new post repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All posts, newest first
    pub async fn list(&self) -> DatabaseResult<Vec<Post>> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.title, p.body, p.created, p.author_id, u.username
            FROM post p JOIN user u ON p.author_id = u.id
            ORDER BY p.created DESC, p.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    /// Find a post by ID
    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Post>> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.title, p.body, p.created, p.author_id, u.username
            FROM post p JOIN user u ON p.author_id = u.id
            WHERE p.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    /// Create a post and return its id
    pub async fn create(&self, author_id: i64, title: &str, body: &str) -> DatabaseResult<i64> {
        info!("Creating post for user {}: {}", author_id, title);

        let result = sqlx::query("INSERT INTO post (title, body, author_id) VALUES (?, ?, ?)")
            .bind(title)
            .bind(body)
            .bind(author_id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok(result.last_insert_rowid())
    }

    /// Replace a post's title and body
    pub async fn update(&self, id: i64, title: &str, body: &str) -> DatabaseResult<()> {
        info!("Updating post {}", id);

        sqlx::query("UPDATE post SET title = ?, body = ? WHERE id = ?")
            .bind(title)
            .bind(body)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok(())
    }

    /// Delete a post
    pub async fn delete(&self, id: i64) -> DatabaseResult<()> {
        info!("Deleting post {}", id);

        sqlx::query("DELETE FROM post WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(())
    }
}
