//! User model and the ownership collection.
//!
//! The owned-book list is the one piece of real in-memory state in this
//! service: duplicate-free by book identity, insertion order preserved, and
//! only mutable through [`User::add_book`] / [`User::remove_book`]. Callers
//! get a read-only view and must save the user back themselves.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

use super::book::Book;

/// Minimum plaintext password length, checked before hashing
pub const MIN_PASSWORD_LEN: usize = 6;

fn non_empty(field: &'static str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(field, format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Check a plaintext password against the length policy
pub fn check_password_length(password: &str) -> AppResult<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(
            "password",
            format!("password must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    Ok(())
}

/// User record with its ordered collection of owned books
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct User {
    id: Option<i64>,
    /// Login key, expected unique
    username: String,
    /// Display name
    name: String,
    birth_date: NaiveDate,
    /// Argon2 hash, never serialized
    #[serde(skip_serializing)]
    password: String,
    books: Vec<Book>,
}

impl User {
    /// Build a validated user from a transport payload. The password hash is
    /// set separately by the service, which owns the plaintext.
    pub fn from_payload(payload: &UserPayload) -> AppResult<Self> {
        let mut user = User {
            id: payload.id,
            username: String::new(),
            name: String::new(),
            birth_date: NaiveDate::MIN,
            password: String::new(),
            books: Vec::new(),
        };

        user.set_username(&payload.username)?;
        user.set_name(&payload.name)?;
        user.set_birth_date(payload.birth_date)?;

        Ok(user)
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn birth_date(&self) -> NaiveDate {
        self.birth_date
    }

    pub fn password_hash(&self) -> &str {
        &self.password
    }

    /// Read-only view of the owned-book collection, in the order first added
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn set_username(&mut self, username: &str) -> AppResult<()> {
        non_empty("username", username)?;
        self.username = username.to_string();
        Ok(())
    }

    pub fn set_name(&mut self, name: &str) -> AppResult<()> {
        non_empty("name", name)?;
        self.name = name.to_string();
        Ok(())
    }

    /// Birth date must be strictly before today at the time it is set
    pub fn set_birth_date(&mut self, birth_date: NaiveDate) -> AppResult<()> {
        if birth_date >= Utc::now().date_naive() {
            return Err(AppError::validation(
                "birth_date",
                "birth_date cannot be later than the current date",
            ));
        }
        self.birth_date = birth_date;
        Ok(())
    }

    /// Store an already-hashed password. Length policy applies to the
    /// plaintext and is checked by the caller before hashing.
    pub fn set_password_hash(&mut self, hash: &str) {
        self.password = hash.to_string();
    }

    /// Append a book to the collection. Adding a book that is already owned
    /// fails and leaves the collection unchanged.
    pub fn add_book(&mut self, book: Book) -> AppResult<()> {
        if self.books.iter().any(|owned| same_book(owned, &book)) {
            return Err(AppError::AlreadyOwned);
        }
        self.books.push(book);
        Ok(())
    }

    /// Remove a book from the collection. Removing a book that is not owned
    /// is a deliberate no-op, asymmetric with `add_book` on purpose.
    pub fn remove_book(&mut self, book: &Book) {
        if let Some(pos) = self.books.iter().position(|owned| same_book(owned, book)) {
            self.books.remove(pos);
        }
    }

    /// Replace the loaded collection from the store. Rows come back ordered
    /// and duplicate-free (junction table primary key), so no re-check.
    pub(crate) fn load_books(&mut self, books: Vec<Book>) {
        self.books = books;
    }
}

/// Membership is by store identity; unsaved books fall back to the ISBN
/// natural key.
fn same_book(a: &Book, b: &Book) -> bool {
    match (a.id(), b.id()) {
        (Some(x), Some(y)) => x == y,
        (None, None) => a.isbn() == b.isbn(),
        _ => false,
    }
}

/// User row as read back from the store; books are loaded separately
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub birth_date: NaiveDate,
    pub password: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: Some(row.id),
            username: row.username,
            name: row.name,
            birth_date: row.birth_date,
            password: row.password,
            books: Vec::new(),
        }
    }
}

/// Inbound user representation (create and replace-style update)
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserPayload {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
    pub name: String,
    pub birth_date: NaiveDate,
    /// Plaintext secret; required on create, optional on update (absent
    /// keeps the stored hash)
    #[serde(default)]
    pub password: Option<String>,
}

/// User directory search parameters. `sequence` is a case-insensitive
/// substring match on the display name; the birth-date range is inclusive
/// and either bound may be omitted.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    pub sequence: Option<String>,
    /// Inclusive lower birth-date bound, ISO 8601 (`YYYY-MM-DD`)
    pub start_date: Option<String>,
    /// Inclusive upper birth-date bound, ISO 8601 (`YYYY-MM-DD`)
    pub end_date: Option<String>,
    /// Zero-based page offset
    pub from: Option<i64>,
    pub size: Option<i64>,
    /// Sort field, ascending (default: id)
    pub sort: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::book::BookRow;

    fn book(id: i64, title: &str) -> Book {
        Book::from(BookRow {
            id,
            genre: "Fantasy".to_string(),
            author: "J. K. Rowling".to_string(),
            image: "https://covers.example.org/x.jpg".to_string(),
            title: title.to_string(),
            subtitle: "-".to_string(),
            publisher: "Bloomsbury".to_string(),
            year: "1997".to_string(),
            pages: 223,
            isbn: format!("isbn-{}", id),
        })
    }

    fn user() -> User {
        User::from(UserRow {
            id: 1,
            username: "ddelapava".to_string(),
            name: "Daniel De La Pava".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1989, 10, 16).unwrap(),
            password: "$argon2id$dummy".to_string(),
        })
    }

    #[test]
    fn add_book_appends_in_order() {
        let mut u = user();
        u.add_book(book(1, "first")).unwrap();
        u.add_book(book(2, "second")).unwrap();
        let titles: Vec<&str> = u.books().iter().map(|b| b.title()).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[test]
    fn add_owned_book_fails_and_leaves_collection_unchanged() {
        let mut u = user();
        u.add_book(book(1, "first")).unwrap();
        let err = u.add_book(book(1, "first")).unwrap_err();
        assert!(matches!(err, AppError::AlreadyOwned));
        assert_eq!(u.books().len(), 1);
    }

    #[test]
    fn remove_absent_book_is_a_no_op() {
        let mut u = user();
        u.add_book(book(1, "first")).unwrap();
        u.remove_book(&book(99, "missing"));
        assert_eq!(u.books().len(), 1);
    }

    #[test]
    fn remove_preserves_order_of_the_rest() {
        let mut u = user();
        u.add_book(book(1, "b1")).unwrap();
        u.add_book(book(2, "b2")).unwrap();
        u.remove_book(&book(1, "b1"));
        let titles: Vec<&str> = u.books().iter().map(|b| b.title()).collect();
        assert_eq!(titles, vec!["b2"]);
    }

    #[test]
    fn birth_date_must_be_in_the_past() {
        let mut u = user();
        let today = Utc::now().date_naive();
        assert!(u.set_birth_date(today).is_err());
        assert!(u.set_birth_date(today + chrono::Duration::days(1)).is_err());
        assert!(u.set_birth_date(today - chrono::Duration::days(1)).is_ok());
    }

    #[test]
    fn password_length_policy() {
        assert!(check_password_length("12345").is_err());
        assert!(check_password_length("123456").is_ok());
    }

    #[test]
    fn rejects_empty_username() {
        let payload = UserPayload {
            id: None,
            username: "".to_string(),
            name: "Somebody".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            password: None,
        };
        let err = User::from_payload(&payload).unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "username", .. }));
    }
}
