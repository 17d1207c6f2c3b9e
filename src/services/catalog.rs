//! Catalog management service

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookPayload, BookQuery},
    repository::Repository,
};

use super::open_library::OpenLibraryService;

/// `find_by_isbn` outcome: whether the book came from the store or was just
/// created from external metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsbnLookup {
    Existing,
    Created,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    open_library: OpenLibraryService,
}

impl CatalogService {
    pub fn new(repository: Repository, open_library: OpenLibraryService) -> Self {
        Self {
            repository,
            open_library,
        }
    }

    /// Search books with optional filters and pagination
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.find_all(query).await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// First book by the given author
    pub async fn get_book_by_author(&self, author: &str) -> AppResult<Book> {
        self.repository
            .books
            .find_first_by_author(author)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No book by author {}", author)))
    }

    /// Create a new book from a validated payload
    pub async fn create_book(&self, payload: &BookPayload) -> AppResult<Book> {
        let book = Book::from_payload(payload)?;
        self.repository.books.create(&book).await
    }

    /// Replace-style update. The payload must carry the target id; a
    /// mismatch is rejected before the store is touched at all.
    pub async fn update_book(&self, id: i64, payload: &BookPayload) -> AppResult<Book> {
        if payload.id != Some(id) {
            return Err(AppError::IdMismatch {
                payload: payload.id,
                target: id,
            });
        }

        self.repository.books.get_by_id(id).await?;
        let book = Book::from_payload(payload)?;
        self.repository.books.update(id, &book).await
    }

    /// Delete a book by id; a missing id is not-found, never a silent success
    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        self.repository.books.delete(id).await
    }

    /// Get a book by ISBN, falling back to the external catalog: a store hit
    /// is returned as-is, a lookup hit is persisted as a new book, and a
    /// lookup miss (or unreachable catalog) surfaces not-found.
    pub async fn find_by_isbn(&self, isbn: &str) -> AppResult<(Book, IsbnLookup)> {
        if let Some(book) = self.repository.books.get_by_isbn(isbn).await? {
            return Ok((book, IsbnLookup::Existing));
        }

        let payload = self
            .open_library
            .lookup(isbn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with isbn {} not found", isbn)))?;

        let book = Book::from_payload(&payload)?;
        let created = self.repository.books.create(&book).await?;
        tracing::info!("Created book id {:?} from external catalog (isbn {})", created.id(), isbn);
        Ok((created, IsbnLookup::Created))
    }
}
