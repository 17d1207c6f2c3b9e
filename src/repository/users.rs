//! Users repository for database operations.
//!
//! Ownership lives in the `user_books` junction table: one row per owned
//! book with an explicit position, reloaded in order and replaced wholesale
//! inside a transaction when the collection changes.

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookRow},
        user::{User, UserQuery, UserRow},
    },
};

use super::{page_offset, Bind};

pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Parsed user search plan. Date bounds are validated here, before any
/// query runs against the store.
#[derive(Debug, Default)]
pub struct UserSearch {
    pub sequence: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub from: i64,
    pub size: i64,
    pub sort: Option<String>,
}

fn parse_date_bound(field: &'static str, value: Option<&str>) -> AppResult<Option<NaiveDate>> {
    match value {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(|_| AppError::InvalidFilter(format!("malformed {} date: {}", field, s))),
    }
}

impl TryFrom<&UserQuery> for UserSearch {
    type Error = AppError;

    fn try_from(query: &UserQuery) -> AppResult<Self> {
        Ok(UserSearch {
            sequence: query.sequence.clone().filter(|s| !s.is_empty()),
            start_date: parse_date_bound("start_date", query.start_date.as_deref())?,
            end_date: parse_date_bound("end_date", query.end_date.as_deref())?,
            from: query.from.unwrap_or(0).max(0),
            size: query.size.unwrap_or(DEFAULT_PAGE_SIZE).max(1),
            sort: query.sort.clone(),
        })
    }
}

fn sort_column(sort: Option<&str>) -> AppResult<&'static str> {
    match sort.unwrap_or("id") {
        "id" => Ok("id"),
        "username" => Ok("username"),
        "name" => Ok("name"),
        "birth_date" => Ok("birth_date"),
        other => Err(AppError::InvalidFilter(format!("unknown sort field: {}", other))),
    }
}

/// Make LIKE metacharacters in a search fragment match literally
fn escape_like(fragment: &str) -> String {
    fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// WHERE clause for the user directory search: case-insensitive substring
/// on the display name plus an inclusive birth-date range where either
/// bound may be left open.
fn where_clause(search: &UserSearch) -> (String, Vec<Bind>) {
    let mut conditions = vec!["1=1".to_string()];
    let mut binds: Vec<Bind> = Vec::new();

    if let Some(ref sequence) = search.sequence {
        binds.push(Bind::Text(format!("%{}%", escape_like(&sequence.to_lowercase()))));
        conditions.push(format!("LOWER(name) LIKE ${}", binds.len()));
    }

    if let Some(start) = search.start_date {
        binds.push(Bind::Date(start));
        conditions.push(format!("birth_date >= ${}", binds.len()));
    }

    if let Some(end) = search.end_date {
        binds.push(Bind::Date(end));
        conditions.push(format!("birth_date <= ${}", binds.len()));
    }

    (conditions.join(" AND "), binds)
}

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID, with the owned-book collection in insertion order
    pub async fn get_by_id(&self, id: i64) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, name, birth_date, password FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;

        let mut user = User::from(row);
        user.load_books(self.load_books(id).await?);
        Ok(user)
    }

    /// Get user by username, the login natural key
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, name, birth_date, password FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Ok(None),
            Some(row) => {
                let id = row.id;
                let mut user = User::from(row);
                user.load_books(self.load_books(id).await?);
                Ok(Some(user))
            }
        }
    }

    async fn load_books(&self, user_id: i64) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRow>(
            r#"
            SELECT b.id, b.genre, b.author, b.image, b.title, b.subtitle,
                   b.publisher, b.year, b.pages, b.isbn
            FROM user_books ub
            JOIN books b ON b.id = ub.book_id
            WHERE ub.user_id = $1
            ORDER BY ub.position
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Book::from).collect())
    }

    /// Search users with pagination
    pub async fn search(&self, search: &UserSearch) -> AppResult<(Vec<User>, i64)> {
        let offset = page_offset(search.from, search.size)?;
        let sort = sort_column(search.sort.as_deref())?;
        let (clause, binds) = where_clause(search);

        let count_sql = format!("SELECT COUNT(*) FROM users WHERE {}", clause);
        let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
        for bind in &binds {
            count = match bind {
                Bind::Text(v) => count.bind(v.clone()),
                Bind::Int(v) => count.bind(*v),
                Bind::Date(v) => count.bind(*v),
            };
        }
        let total = count.fetch_one(&self.pool).await?;

        let select_sql = format!(
            "SELECT id, username, name, birth_date, password \
             FROM users WHERE {} ORDER BY {} LIMIT {} OFFSET {}",
            clause, sort, search.size, offset
        );
        let mut select = sqlx::query_as::<_, UserRow>(&select_sql);
        for bind in &binds {
            select = match bind {
                Bind::Text(v) => select.bind(v.clone()),
                Bind::Int(v) => select.bind(*v),
                Bind::Date(v) => select.bind(*v),
            };
        }
        let rows = select.fetch_all(&self.pool).await?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            let mut user = User::from(row);
            user.load_books(self.load_books(id).await?);
            users.push(user);
        }

        Ok((users, total))
    }

    /// Insert a new user, letting the store assign the id
    pub async fn create(&self, user: &User) -> AppResult<User> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (username, name, birth_date, password)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(user.username())
        .bind(user.name())
        .bind(user.birth_date())
        .bind(user.password_hash())
        .fetch_one(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    /// Replace-style update of the user record. The ownership list is not
    /// touched here; it only changes through `save_books`.
    pub async fn update(&self, id: i64, user: &User) -> AppResult<User> {
        sqlx::query(
            "UPDATE users SET username = $1, name = $2, birth_date = $3, password = $4 WHERE id = $5",
        )
        .bind(user.username())
        .bind(user.name())
        .bind(user.birth_date())
        .bind(user.password_hash())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    /// Store a new password hash for the user
    pub async fn update_password(&self, id: i64, hash: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }

        Ok(())
    }

    /// Persist the user's owned-book collection: replace the junction rows
    /// in one transaction, positions following the in-memory order.
    pub async fn save_books(&self, user_id: i64, books: &[Book]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_books WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for (position, book) in books.iter().enumerate() {
            let book_id = book
                .id()
                .ok_or_else(|| AppError::Internal("Owned book has no id".to_string()))?;
            sqlx::query(
                "INSERT INTO user_books (user_id, book_id, position) VALUES ($1, $2, $3)",
            )
            .bind(user_id)
            .bind(book_id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Delete a user by id. Ownership rows cascade; owned books stay.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_filter_is_lowercased_substring() {
        let search = UserSearch {
            sequence: Some("Kit".to_string()),
            ..UserSearch::default()
        };
        let (clause, binds) = where_clause(&search);
        assert_eq!(clause, "1=1 AND LOWER(name) LIKE $1");
        assert_eq!(binds, vec![Bind::Text("%kit%".to_string())]);
    }

    #[test]
    fn sequence_like_metacharacters_match_literally() {
        let search = UserSearch {
            sequence: Some("100%_done".to_string()),
            ..UserSearch::default()
        };
        let (_, binds) = where_clause(&search);
        assert_eq!(binds, vec![Bind::Text("%100\\%\\_done%".to_string())]);
    }

    #[test]
    fn date_range_bounds_are_independent() {
        let start = NaiveDate::from_ymd_opt(1980, 1, 1).unwrap();
        let search = UserSearch {
            start_date: Some(start),
            ..UserSearch::default()
        };
        let (clause, binds) = where_clause(&search);
        assert_eq!(clause, "1=1 AND birth_date >= $1");
        assert_eq!(binds, vec![Bind::Date(start)]);

        let end = NaiveDate::from_ymd_opt(1995, 12, 31).unwrap();
        let search = UserSearch {
            start_date: Some(start),
            end_date: Some(end),
            ..UserSearch::default()
        };
        let (clause, _) = where_clause(&search);
        assert_eq!(clause, "1=1 AND birth_date >= $1 AND birth_date <= $2");
    }

    #[test]
    fn malformed_date_fails_before_query() {
        let query = UserQuery {
            start_date: Some("yesterday".to_string()),
            ..UserQuery::default()
        };
        let err = UserSearch::try_from(&query).unwrap_err();
        assert!(matches!(err, AppError::InvalidFilter(_)));
    }

    #[test]
    fn empty_query_degrades_to_match_everything() {
        let query = UserQuery::default();
        let search = UserSearch::try_from(&query).unwrap();
        let (clause, binds) = where_clause(&search);
        assert_eq!(clause, "1=1");
        assert!(binds.is_empty());
        assert_eq!(search.from, 0);
        assert_eq!(search.size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn unknown_sort_field_is_an_error() {
        assert_eq!(sort_column(None).unwrap(), "id");
        assert!(matches!(
            sort_column(Some("password")),
            Err(AppError::InvalidFilter(_))
        ));
    }
}
