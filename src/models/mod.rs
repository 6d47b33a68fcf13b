//! Data models for Bookshelf

pub mod book;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookInput, NewBook};
pub use user::{Role, User, UserClaims, UserInfo};
