//! Flaskr models

pub mod post;
pub mod user;

// Re-export for convenience
pub use post::{Post, PostForm};
pub use user::{Credentials, User};
