//! Database repositories

pub mod post;
pub mod user;

pub use post::PostRepository;
pub use user::UserRepository;
