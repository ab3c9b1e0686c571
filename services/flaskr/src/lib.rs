//! Flaskr: a small blog behind a session-based authentication gate
//!
//! Users register and log in with a username and password; the logged-in
//! user's id is kept in a server-side session, referenced by a signed cookie,
//! and is resolved to a user row at the start of every request. Blog posts
//! can be read by anyone and written only by their logged-in author.

pub mod error;
pub mod gate;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repositories;
pub mod routes;
pub mod session;
pub mod settings;

use common::{
    database::{DatabaseConfig, init_db, init_pool},
    error::{DatabaseError, DatabaseResult},
};
use sqlx::SqlitePool;
use tower_sessions_sqlx_store::SqliteStore;
use tracing::info;

use crate::{
    gate::AuthGate,
    repositories::{PostRepository, UserRepository},
    settings::{SessionSettings, Settings},
};

pub use routes::create_router;

/// Schema for the `user` and `post` tables
pub const SCHEMA: &str = include_str!("../schema.sql");

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub auth_gate: AuthGate,
    pub post_repository: PostRepository,
    pub session_store: SqliteStore,
    pub session_settings: SessionSettings,
}

impl AppState {
    pub fn new(pool: SqlitePool, settings: &Settings) -> Self {
        let auth_gate = AuthGate::new(UserRepository::new(pool.clone()))
            .with_generic_login_errors(settings.auth.generic_login_errors);

        Self {
            post_repository: PostRepository::new(pool.clone()),
            session_store: SqliteStore::new(pool.clone()),
            db_pool: pool,
            auth_gate,
            session_settings: settings.session.clone(),
        }
    }
}

/// Open the database, creating the tables if they are missing
///
/// Existing data is left alone; `reset_database` is the destructive variant.
/// The session table is created here too.
pub async fn open_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = init_pool(config).await?;

    let has_schema: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'user')",
    )
    .fetch_one(&pool)
    .await
    .map_err(DatabaseError::Query)?;

    if !has_schema {
        info!("Database has no tables yet, applying schema");
        init_db(&pool, SCHEMA).await?;
    }
    migrate_session_store(&pool).await?;

    Ok(pool)
}

/// Drop all data, sessions included, and recreate the tables
pub async fn reset_database(pool: &SqlitePool) -> DatabaseResult<()> {
    init_db(pool, SCHEMA).await?;
    migrate_session_store(pool).await
}

async fn migrate_session_store(pool: &SqlitePool) -> DatabaseResult<()> {
    SqliteStore::new(pool.clone())
        .migrate()
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))
}
