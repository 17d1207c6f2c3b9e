//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookshelf API",
        version = "1.0.0",
        description = "Book catalog and personal collection REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api", description = "API root")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::get_book_by_author,
        books::get_book_by_isbn,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Users
        users::list_users,
        users::search_users,
        users::get_user,
        users::get_user_by_username,
        users::me,
        users::identity,
        users::create_user,
        users::update_user,
        users::update_password,
        users::delete_user,
        users::add_book,
        users::remove_book,
        users::login,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::BookPayload,
            crate::models::book::BookQuery,
            // Users
            crate::models::user::User,
            crate::models::user::UserPayload,
            crate::models::user::UserQuery,
            users::LoginRequest,
            users::PasswordPayload,
            crate::services::auth::Identity,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
            crate::error::ErrorKind,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog management"),
        (name = "users", description = "User management and book ownership")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
