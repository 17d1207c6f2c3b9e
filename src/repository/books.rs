//! Books repository for database operations.
//!
//! The search path assembles one WHERE clause out of the optional filters
//! and runs it twice with identical binds: once for the total count, once
//! for the page slice. Clause assembly is pure and unit-tested below.

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, BookRow},
};

use super::{page_offset, Bind};

pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Map a requested sort key onto a column. An unrecognized key is an error,
/// never silently ignored.
fn sort_column(sort: Option<&str>) -> AppResult<&'static str> {
    match sort.unwrap_or("id") {
        "id" => Ok("id"),
        "genre" => Ok("genre"),
        "author" => Ok("author"),
        "image" => Ok("image"),
        "title" => Ok("title"),
        "subtitle" => Ok("subtitle"),
        "publisher" => Ok("publisher"),
        "year" => Ok("year"),
        "pages" => Ok("pages"),
        "isbn" => Ok("isbn"),
        other => Err(AppError::InvalidFilter(format!("unknown sort field: {}", other))),
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.is_empty()).unwrap_or(false)
}

/// Build the WHERE clause for a book search. Unset fields (absent or empty
/// string, zero for pages) impose no constraint; set text fields match
/// case-insensitive exact.
fn where_clause(query: &BookQuery) -> (String, Vec<Bind>) {
    let mut conditions = vec!["1=1".to_string()];
    let mut binds: Vec<Bind> = Vec::new();

    let mut ci_exact = |column: &str, value: &Option<String>| {
        if is_set(value) {
            binds.push(Bind::Text(value.clone().unwrap_or_default()));
            conditions.push(format!("LOWER({}) = LOWER(${})", column, binds.len()));
        }
    };

    ci_exact("publisher", &query.publisher);
    ci_exact("genre", &query.genre);
    ci_exact("author", &query.author);
    ci_exact("image", &query.image);
    ci_exact("title", &query.title);
    ci_exact("subtitle", &query.subtitle);
    ci_exact("isbn", &query.isbn);

    // Year is text in storage but validated numeric, so exact match suffices
    if is_set(&query.year) {
        binds.push(Bind::Text(query.year.clone().unwrap_or_default()));
        conditions.push(format!("year = ${}", binds.len()));
    }

    if let Some(pages) = query.pages {
        if pages != 0 {
            binds.push(Bind::Int(pages));
            conditions.push(format!("pages = ${}", binds.len()));
        }
    }

    (conditions.join(" AND "), binds)
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        let row = sqlx::query_as::<_, BookRow>(
            "SELECT id, genre, author, image, title, subtitle, publisher, year, pages, isbn \
             FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        Ok(Book::from(row))
    }

    /// Get book by ISBN (natural alternate key)
    pub async fn get_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(
            "SELECT id, genre, author, image, title, subtitle, publisher, year, pages, isbn \
             FROM books WHERE isbn = $1",
        )
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Book::from))
    }

    /// First book by author, lowest id wins
    pub async fn find_first_by_author(&self, author: &str) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(
            "SELECT id, genre, author, image, title, subtitle, publisher, year, pages, isbn \
             FROM books WHERE author = $1 ORDER BY id LIMIT 1",
        )
        .bind(author)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Book::from))
    }

    /// Search books with optional filters and pagination
    pub async fn find_all(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let from = query.from.unwrap_or(0).max(0);
        let size = query.size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let offset = page_offset(from, size)?;
        let sort = sort_column(query.sort.as_deref())?;

        let (clause, binds) = where_clause(query);

        let count_sql = format!("SELECT COUNT(*) FROM books WHERE {}", clause);
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
            "SELECT id, genre, author, image, title, subtitle, publisher, year, pages, isbn \
             FROM books WHERE {} ORDER BY {} LIMIT {} OFFSET {}",
            clause, sort, size, offset
        );
        let mut select = sqlx::query_as::<_, BookRow>(&select_sql);
        for bind in &binds {
            select = match bind {
                Bind::Text(v) => select.bind(v.clone()),
                Bind::Int(v) => select.bind(*v),
                Bind::Date(v) => select.bind(*v),
            };
        }
        let books = select
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Book::from)
            .collect();

        Ok((books, total))
    }

    /// Insert a new book, letting the store assign the id
    pub async fn create(&self, book: &Book) -> AppResult<Book> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO books (genre, author, image, title, subtitle, publisher, year, pages, isbn)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(book.genre())
        .bind(book.author())
        .bind(book.image())
        .bind(book.title())
        .bind(book.subtitle())
        .bind(book.publisher())
        .bind(book.year())
        .bind(book.pages())
        .bind(book.isbn())
        .fetch_one(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    /// Replace-style update of an existing book
    pub async fn update(&self, id: i64, book: &Book) -> AppResult<Book> {
        sqlx::query(
            r#"
            UPDATE books
            SET genre = $1, author = $2, image = $3, title = $4, subtitle = $5,
                publisher = $6, year = $7, pages = $8, isbn = $9
            WHERE id = $10
            "#,
        )
        .bind(book.genre())
        .bind(book.author())
        .bind(book.image())
        .bind(book.title())
        .bind(book.subtitle())
        .bind(book.publisher())
        .bind(book.year())
        .bind(book.pages())
        .bind(book.isbn())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    /// Delete a book by id. Ownership rows go with it (FK cascade); a
    /// missing id is reported, not swallowed.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_filters_impose_no_constraint() {
        let (clause, binds) = where_clause(&BookQuery::default());
        assert_eq!(clause, "1=1");
        assert!(binds.is_empty());
    }

    #[test]
    fn empty_string_and_zero_are_unset_sentinels() {
        let query = BookQuery {
            publisher: Some(String::new()),
            pages: Some(0),
            ..BookQuery::default()
        };
        let (clause, binds) = where_clause(&query);
        assert_eq!(clause, "1=1");
        assert!(binds.is_empty());
    }

    #[test]
    fn text_filters_are_case_insensitive_exact() {
        let query = BookQuery {
            publisher: Some("BLOOMSBURY".to_string()),
            ..BookQuery::default()
        };
        let (clause, binds) = where_clause(&query);
        assert_eq!(clause, "1=1 AND LOWER(publisher) = LOWER($1)");
        assert_eq!(binds, vec![Bind::Text("BLOOMSBURY".to_string())]);
    }

    #[test]
    fn set_filters_combine_in_order() {
        let query = BookQuery {
            genre: Some("Fantasy".to_string()),
            year: Some("1997".to_string()),
            pages: Some(223),
            ..BookQuery::default()
        };
        let (clause, binds) = where_clause(&query);
        assert_eq!(
            clause,
            "1=1 AND LOWER(genre) = LOWER($1) AND year = $2 AND pages = $3"
        );
        assert_eq!(
            binds,
            vec![
                Bind::Text("Fantasy".to_string()),
                Bind::Text("1997".to_string()),
                Bind::Int(223),
            ]
        );
    }

    #[test]
    fn unknown_sort_field_is_an_error() {
        assert_eq!(sort_column(None).unwrap(), "id");
        assert_eq!(sort_column(Some("publisher")).unwrap(), "publisher");
        let err = sort_column(Some("price; DROP TABLE books")).unwrap_err();
        assert!(matches!(err, AppError::InvalidFilter(_)));
    }
}
