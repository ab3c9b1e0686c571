//! Custom error types for the common library
//!
//! This module defines the database error taxonomy shared by the services.
//! Unique-constraint violations get their own variant so callers can tell a
//! conflicting write apart from a broken connection.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// A write was rejected by a UNIQUE constraint
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(#[source] SqlxError),

    /// Error occurred while applying the schema
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// Classify a query error, separating constraint violations from the rest
    pub fn from_query(err: SqlxError) -> Self {
        match &err {
            SqlxError::Database(db_err) if db_err.is_unique_violation() => {
                DatabaseError::UniqueViolation(err)
            }
            _ => DatabaseError::Query(err),
        }
    }

    /// Whether this error is a unique-constraint violation
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DatabaseError::UniqueViolation(_))
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
