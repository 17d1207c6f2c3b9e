//! Data models for Bookshelf

pub mod book;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookPayload, BookQuery};
pub use user::{User, UserPayload, UserQuery};
