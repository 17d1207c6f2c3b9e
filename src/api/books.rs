//! Book catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::book::{Book, BookPayload, BookQuery},
    repository::books::DEFAULT_PAGE_SIZE,
    services::catalog::IsbnLookup,
};

use super::{AuthenticatedUser, PaginatedResponse};

/// List books with optional filters and pagination
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("basic_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "Matching books", body = PaginatedResponse<Book>),
        (status = 400, description = "Invalid filter"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_identity): AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<PaginatedResponse<Book>>> {
    let (books, total) = state.services.catalog.search_books(&query).await?;

    Ok(Json(PaginatedResponse {
        items: books,
        total,
        from: query.from.unwrap_or(0),
        size: query.size.unwrap_or(DEFAULT_PAGE_SIZE),
    }))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("basic_auth" = [])),
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_identity): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Get the first book by the given author
#[utoipa::path(
    get,
    path = "/books/author/{author}",
    tag = "books",
    security(("basic_auth" = [])),
    params(
        ("author" = String, Path, description = "Author name, exact match")
    ),
    responses(
        (status = 200, description = "First book by that author", body = Book),
        (status = 404, description = "No book by that author")
    )
)]
pub async fn get_book_by_author(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_identity): AuthenticatedUser,
    Path(author): Path<String>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book_by_author(&author).await?;
    Ok(Json(book))
}

/// Get a book by ISBN, importing it from the external catalog on a store
/// miss. Returns 201 when the book was just imported, 200 otherwise.
#[utoipa::path(
    get,
    path = "/books/isbn/{isbn}",
    tag = "books",
    security(("basic_auth" = [])),
    params(
        ("isbn" = String, Path, description = "ISBN")
    ),
    responses(
        (status = 200, description = "Book already in the catalog", body = Book),
        (status = 201, description = "Book imported from the external catalog", body = Book),
        (status = 404, description = "Unknown ISBN")
    )
)]
pub async fn get_book_by_isbn(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_identity): AuthenticatedUser,
    Path(isbn): Path<String>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let (book, outcome) = state.services.catalog.find_by_isbn(&isbn).await?;
    let status = match outcome {
        IsbnLookup::Existing => StatusCode::OK,
        IsbnLookup::Created => StatusCode::CREATED,
    };
    Ok((status, Json(book)))
}

/// Create a new book (open to anonymous callers)
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = BookPayload,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    Json(payload): Json<BookPayload>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let created = state.services.catalog.create_book(&payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an existing book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("basic_auth" = [])),
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Payload id does not match the path id")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_identity): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<BookPayload>,
) -> AppResult<Json<Book>> {
    let updated = state.services.catalog.update_book(id, &payload).await?;
    Ok(Json(updated))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("basic_auth" = [])),
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_identity): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
