//! Bookshelf catalog server
//!
//! A REST JSON API for managing a book catalog and per-user book
//! collections, backed by PostgreSQL and the Open Library catalog for
//! ISBN imports.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
