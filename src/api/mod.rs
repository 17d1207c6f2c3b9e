//! API handlers for Bookshelf REST endpoints

pub mod books;
pub mod health;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppError, services::auth::Identity, AppState};

/// Extractor for the caller's identity from HTTP Basic credentials.
///
/// Every request carries its own credentials; there is no session or
/// token state, so each extraction verifies the password against the
/// store.
pub struct AuthenticatedUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Get the Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        // Check for Basic credentials
        if !auth_header.starts_with("Basic ") {
            return Err(AppError::Authentication("Invalid authorization header format".to_string()));
        }

        let decoded = STANDARD
            .decode(&auth_header[6..])
            .map_err(|_| AppError::Authentication("Invalid base64 credentials".to_string()))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| AppError::Authentication("Invalid credential encoding".to_string()))?;

        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| AppError::Authentication("Malformed basic credentials".to_string()))?;

        let identity = state.services.auth.authenticate(username, password).await?;

        Ok(AuthenticatedUser(identity))
    }
}

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// List of items
    pub items: Vec<T>,
    /// Total number of items
    pub total: i64,
    /// Zero-based page offset echoed back from the request
    pub from: i64,
    /// Page size
    pub size: i64,
}
