//! User management and ownership service.
//!
//! Ownership mutations load the user fresh, go through the in-memory
//! collection invariants, then save the list back. There is no version
//! check: two concurrent mutations on the same user race last-writer-wins
//! at the store, a documented limitation of this design.

use crate::{
    error::{AppError, AppResult},
    models::user::{check_password_length, User, UserPayload, UserQuery},
    repository::{users::UserSearch, Repository},
};

use super::auth::hash_password;

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get user by ID
    pub async fn get_user(&self, id: i64) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Get user by username (directory lookup, not authentication)
    pub async fn get_by_username(&self, username: &str) -> AppResult<User> {
        self.repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with username {} not found", username)))
    }

    /// Search the user directory; date bounds are parsed (and rejected)
    /// before anything runs against the store
    pub async fn search_users(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        let search = UserSearch::try_from(query)?;
        self.repository.users.search(&search).await
    }

    /// Create a new user; the payload must carry a plaintext password,
    /// which is hashed before it ever reaches the store
    pub async fn create_user(&self, payload: &UserPayload) -> AppResult<User> {
        let mut user = User::from_payload(payload)?;

        let password = payload
            .password
            .as_deref()
            .ok_or_else(|| AppError::validation("password", "password is required"))?;
        user.set_password_hash(&hash_password(password)?);

        if self
            .repository
            .users
            .get_by_username(user.username())
            .await?
            .is_some()
        {
            return Err(AppError::validation("username", "username already exists"));
        }

        self.repository.users.create(&user).await
    }

    /// Replace-style update. Id mismatch is rejected before the store is
    /// touched; an absent password keeps the stored hash.
    pub async fn update_user(&self, id: i64, payload: &UserPayload) -> AppResult<User> {
        if payload.id != Some(id) {
            return Err(AppError::IdMismatch {
                payload: payload.id,
                target: id,
            });
        }

        let existing = self.repository.users.get_by_id(id).await?;

        let mut user = User::from_payload(payload)?;
        match payload.password.as_deref() {
            Some(password) => user.set_password_hash(&hash_password(password)?),
            None => user.set_password_hash(existing.password_hash()),
        }

        self.repository.users.update(id, &user).await
    }

    /// Replace the user's password
    pub async fn update_password(&self, id: i64, password: &str) -> AppResult<()> {
        check_password_length(password)?;
        let hash = hash_password(password)?;
        self.repository.users.update_password(id, &hash).await
    }

    /// Delete a user by id; ownership rows go with it, books stay
    pub async fn delete_user(&self, id: i64) -> AppResult<()> {
        self.repository.users.delete(id).await
    }

    /// Attach a book to a user's collection. Fails if either record is
    /// absent or the book is already owned.
    pub async fn add_book(&self, user_id: i64, book_id: i64) -> AppResult<User> {
        let mut user = self.repository.users.get_by_id(user_id).await?;
        let book = self.repository.books.get_by_id(book_id).await?;

        user.add_book(book)?;
        self.repository.users.save_books(user_id, user.books()).await?;

        Ok(user)
    }

    /// Detach a book from a user's collection. Removing a book the user
    /// does not own is a no-op; the user record is still saved unchanged.
    pub async fn remove_book(&self, user_id: i64, book_id: i64) -> AppResult<User> {
        let mut user = self.repository.users.get_by_id(user_id).await?;
        let book = self.repository.books.get_by_id(book_id).await?;

        user.remove_book(&book);
        self.repository.users.save_books(user_id, user.books()).await?;

        Ok(user)
    }
}
