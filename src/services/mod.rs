//! Business logic services

pub mod auth;
pub mod catalog;
pub mod open_library;
pub mod users;

use crate::{config::OpenLibraryConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub users: users::UsersService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, open_library_config: OpenLibraryConfig) -> Self {
        let open_library = open_library::OpenLibraryService::new(open_library_config);
        Self {
            auth: auth::AuthService::new(repository.clone()),
            catalog: catalog::CatalogService::new(repository.clone(), open_library),
            users: users::UsersService::new(repository),
        }
    }
}
