//! User persistence.
//!
//! Handlers never touch storage directly; they go through
//! [`crate::services::UserService`] which holds an `Arc<dyn UserStore>`.

pub mod json;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::User;

pub use json::JsonUserStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user {0} not found")]
    NotFound(i64),

    #[error("email '{0}' is already registered")]
    DuplicateEmail(String),

    #[error("no user id left to assign")]
    IdsExhausted,

    #[error("user store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("user store file is corrupt: {0}")]
    Serde(#[from] serde_json::Error),
}

/// CRUD over users, keyed by id and email.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<User>, StoreError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn exists(&self, id: i64) -> Result<bool, StoreError>;

    /// Inserts the user, assigning a fresh id when `user.id` is not positive.
    async fn insert(&self, user: User) -> Result<User, StoreError>;

    async fn update(&self, user: User) -> Result<(), StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}
