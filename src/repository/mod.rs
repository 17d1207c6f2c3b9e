//! Repository layer for database operations

pub mod books;
pub mod users;

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::error::{AppError, AppResult};

/// Row offset for a zero-based page. `from` and `size` arrive straight from
/// query parameters, so the multiplication is checked rather than trusted.
pub fn page_offset(from: i64, size: i64) -> AppResult<i64> {
    from.checked_mul(size).ok_or_else(|| {
        AppError::InvalidFilter(format!("page offset out of range: {} x {}", from, size))
    })
}

/// A value bound into a dynamically assembled query, in `$n` order
#[derive(Debug, Clone, PartialEq)]
pub enum Bind {
    Text(String),
    Int(i32),
    Date(NaiveDate),
}

/// Main repository struct holding the database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offset_multiplies_page_by_size() {
        assert_eq!(page_offset(0, 20).unwrap(), 0);
        assert_eq!(page_offset(3, 20).unwrap(), 60);
    }

    #[test]
    fn page_offset_overflow_is_an_invalid_filter() {
        let err = page_offset(i64::MAX, 20).unwrap_err();
        assert!(matches!(err, AppError::InvalidFilter(_)));
        assert!(page_offset(i64::MAX, 1).is_ok());
    }
}
