//! User management and ownership endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{User, UserPayload, UserQuery, MIN_PASSWORD_LEN},
    repository::users::DEFAULT_PAGE_SIZE,
    services::auth::Identity,
};

use super::{AuthenticatedUser, PaginatedResponse};

/// Pagination-only parameters for the plain user listing
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageParams {
    /// Zero-based page offset
    pub from: Option<i64>,
    pub size: Option<i64>,
    /// Sort field, ascending (default: id)
    pub sort: Option<String>,
}

/// Credentials for the explicit login operation
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Password replacement payload
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PasswordPayload {
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

/// List users with pagination
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("basic_auth" = [])),
    params(PageParams),
    responses(
        (status = 200, description = "List of users", body = PaginatedResponse<User>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_identity): AuthenticatedUser,
    Query(page): Query<PageParams>,
) -> AppResult<Json<PaginatedResponse<User>>> {
    let query = UserQuery {
        from: page.from,
        size: page.size,
        sort: page.sort,
        ..UserQuery::default()
    };
    let (users, total) = state.services.users.search_users(&query).await?;

    Ok(Json(PaginatedResponse {
        items: users,
        total,
        from: query.from.unwrap_or(0),
        size: query.size.unwrap_or(DEFAULT_PAGE_SIZE),
    }))
}

/// Search the user directory by name and birth-date range
#[utoipa::path(
    get,
    path = "/users/search",
    tag = "users",
    security(("basic_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "Matching users", body = PaginatedResponse<User>),
        (status = 400, description = "Invalid filter"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn search_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_identity): AuthenticatedUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<PaginatedResponse<User>>> {
    let (users, total) = state.services.users.search_users(&query).await?;

    Ok(Json(PaginatedResponse {
        items: users,
        total,
        from: query.from.unwrap_or(0),
        size: query.size.unwrap_or(DEFAULT_PAGE_SIZE),
    }))
}

/// Get user details by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("basic_auth" = [])),
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_identity): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    let user = state.services.users.get_user(id).await?;
    Ok(Json(user))
}

/// Get user details by username
#[utoipa::path(
    get,
    path = "/users/username/{username}",
    tag = "users",
    security(("basic_auth" = [])),
    params(
        ("username" = String, Path, description = "Username")
    ),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_by_username(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_identity): AuthenticatedUser,
    Path(username): Path<String>,
) -> AppResult<Json<User>> {
    let user = state.services.users.get_by_username(&username).await?;
    Ok(Json(user))
}

/// Get the full record of the authenticated caller
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    security(("basic_auth" = [])),
    responses(
        (status = 200, description = "Caller's user record", body = User),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<crate::AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> AppResult<Json<User>> {
    let user = state.services.users.get_by_username(&identity.username).await?;
    Ok(Json(user))
}

/// Register a new user (open to anonymous callers)
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = UserPayload,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    Json(payload): Json<UserPayload>,
) -> AppResult<(StatusCode, Json<User>)> {
    let created = state.services.users.create_user(&payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an existing user
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("basic_auth" = [])),
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    request_body = UserPayload,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 404, description = "User not found"),
        (status = 422, description = "Payload id does not match the path id")
    )
)]
pub async fn update_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_identity): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<UserPayload>,
) -> AppResult<Json<User>> {
    let updated = state.services.users.update_user(id, &payload).await?;
    Ok(Json(updated))
}

/// Replace the user's password
#[utoipa::path(
    patch,
    path = "/users/{id}/password",
    tag = "users",
    security(("basic_auth" = [])),
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    request_body = PasswordPayload,
    responses(
        (status = 204, description = "Password updated"),
        (status = 400, description = "Password too short"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_password(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_identity): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<PasswordPayload>,
) -> AppResult<StatusCode> {
    payload.validate().map_err(|_| {
        AppError::validation(
            "password",
            format!("password must be at least {} characters", MIN_PASSWORD_LEN),
        )
    })?;

    state.services.users.update_password(id, &payload.password).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("basic_auth" = [])),
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_identity): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a book to the user's collection
#[utoipa::path(
    post,
    path = "/users/{id}/books/{book_id}",
    tag = "users",
    security(("basic_auth" = [])),
    params(
        ("id" = i64, Path, description = "User ID"),
        ("book_id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 201, description = "Book added, updated user returned", body = User),
        (status = 404, description = "User or book not found"),
        (status = 409, description = "Book already owned")
    )
)]
pub async fn add_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_identity): AuthenticatedUser,
    Path((id, book_id)): Path<(i64, i64)>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.services.users.add_book(id, book_id).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Remove a book from the user's collection. Removing a book the user does
/// not own succeeds without changing anything.
#[utoipa::path(
    delete,
    path = "/users/{id}/books/{book_id}",
    tag = "users",
    security(("basic_auth" = [])),
    params(
        ("id" = i64, Path, description = "User ID"),
        ("book_id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Updated user returned", body = User),
        (status = 404, description = "User or book not found")
    )
)]
pub async fn remove_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_identity): AuthenticatedUser,
    Path((id, book_id)): Path<(i64, i64)>,
) -> AppResult<Json<User>> {
    let user = state.services.users.remove_book(id, book_id).await?;
    Ok(Json(user))
}

/// Explicit login with JSON credentials (open to anonymous callers).
/// Shares the verification path with per-request Basic auth.
#[utoipa::path(
    post,
    path = "/users/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated user record", body = User),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "Unknown username")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(credentials): Json<LoginRequest>,
) -> AppResult<Json<User>> {
    let user = state
        .services
        .auth
        .login(&credentials.username, &credentials.password)
        .await?;
    Ok(Json(user))
}

/// Identity probe for the authenticated caller
#[utoipa::path(
    get,
    path = "/users/identity",
    tag = "users",
    security(("basic_auth" = [])),
    responses(
        (status = 200, description = "Caller's identity", body = Identity),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn identity(AuthenticatedUser(identity): AuthenticatedUser) -> Json<Identity> {
    Json(identity)
}
