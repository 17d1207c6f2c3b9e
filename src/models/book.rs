//! Book model and related types.
//!
//! Fields are private: every mutation goes through a fallible setter that
//! validates immediately, so an invalid value can never be observed on a
//! `Book`. Rows read back from the store are converted through [`BookRow`]
//! without re-validation.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

fn non_empty(field: &'static str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(field, format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Book record. The surrogate id is assigned by the store on first save and
/// immutable afterwards; `isbn` is the natural alternate key used for
/// external lookups.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Book {
    id: Option<i64>,
    genre: String,
    author: String,
    /// Cover image URL
    image: String,
    title: String,
    subtitle: String,
    publisher: String,
    /// Publication year, stored as text but validated numeric and positive
    year: String,
    pages: i32,
    isbn: String,
}

impl Book {
    /// Build a validated book from a transport payload. The payload id is
    /// carried over untouched; creation paths ignore it, update paths check
    /// it against the target id before anything else.
    pub fn from_payload(payload: &BookPayload) -> AppResult<Self> {
        let mut book = Book {
            id: payload.id,
            genre: String::new(),
            author: String::new(),
            image: String::new(),
            title: String::new(),
            subtitle: String::new(),
            publisher: String::new(),
            year: String::new(),
            pages: 0,
            isbn: String::new(),
        };

        book.set_genre(&payload.genre)?;
        book.set_author(&payload.author)?;
        book.set_image(&payload.image)?;
        book.set_title(&payload.title)?;
        book.set_subtitle(&payload.subtitle)?;
        book.set_publisher(&payload.publisher)?;
        book.set_year(&payload.year)?;
        book.set_pages(payload.pages)?;
        book.set_isbn(&payload.isbn)?;

        Ok(book)
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn pages(&self) -> i32 {
        self.pages
    }

    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    pub fn set_genre(&mut self, genre: &str) -> AppResult<()> {
        non_empty("genre", genre)?;
        self.genre = genre.to_string();
        Ok(())
    }

    pub fn set_author(&mut self, author: &str) -> AppResult<()> {
        non_empty("author", author)?;
        self.author = author.to_string();
        Ok(())
    }

    pub fn set_image(&mut self, image: &str) -> AppResult<()> {
        non_empty("image", image)?;
        self.image = image.to_string();
        Ok(())
    }

    pub fn set_title(&mut self, title: &str) -> AppResult<()> {
        non_empty("title", title)?;
        self.title = title.to_string();
        Ok(())
    }

    pub fn set_subtitle(&mut self, subtitle: &str) -> AppResult<()> {
        non_empty("subtitle", subtitle)?;
        self.subtitle = subtitle.to_string();
        Ok(())
    }

    pub fn set_publisher(&mut self, publisher: &str) -> AppResult<()> {
        non_empty("publisher", publisher)?;
        self.publisher = publisher.to_string();
        Ok(())
    }

    /// Year is kept as text but must parse as a positive integer
    pub fn set_year(&mut self, year: &str) -> AppResult<()> {
        non_empty("year", year)?;
        match year.trim().parse::<u32>() {
            Ok(y) if y > 0 => {
                self.year = year.trim().to_string();
                Ok(())
            }
            _ => Err(AppError::validation("year", "year must be a positive number")),
        }
    }

    pub fn set_pages(&mut self, pages: i32) -> AppResult<()> {
        if pages <= 0 {
            return Err(AppError::validation("pages", "pages must be greater than zero"));
        }
        self.pages = pages;
        Ok(())
    }

    pub fn set_isbn(&mut self, isbn: &str) -> AppResult<()> {
        non_empty("isbn", isbn)?;
        self.isbn = isbn.to_string();
        Ok(())
    }
}

/// Book row as read back from the store. Stored data already went through
/// the setters, so the conversion is infallible.
#[derive(Debug, Clone, FromRow)]
pub struct BookRow {
    pub id: i64,
    pub genre: String,
    pub author: String,
    pub image: String,
    pub title: String,
    pub subtitle: String,
    pub publisher: String,
    pub year: String,
    pub pages: i32,
    pub isbn: String,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: Some(row.id),
            genre: row.genre,
            author: row.author,
            image: row.image,
            title: row.title,
            subtitle: row.subtitle,
            publisher: row.publisher,
            year: row.year,
            pages: row.pages,
            isbn: row.isbn,
        }
    }
}

/// Inbound book representation (create and replace-style update)
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BookPayload {
    #[serde(default)]
    pub id: Option<i64>,
    pub genre: String,
    pub author: String,
    pub image: String,
    pub title: String,
    pub subtitle: String,
    pub publisher: String,
    pub year: String,
    pub pages: i32,
    pub isbn: String,
}

/// Book search parameters. Empty string (or zero for `pages`) means the
/// field imposes no constraint; set text fields are matched case-insensitive
/// exact, never substring.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    pub publisher: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    pub author: Option<String>,
    pub image: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub pages: Option<i32>,
    pub isbn: Option<String>,
    /// Zero-based page offset
    pub from: Option<i64>,
    pub size: Option<i64>,
    /// Sort field, ascending (default: id)
    pub sort: Option<String>,
}
