//! Repository layer for database operations

pub mod books;
pub mod memory;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{book::NewBook, user::NewUser, Book, User},
};

/// Credential store
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert a user. A duplicate username or email yields `AppError::Conflict`.
    async fn create(&self, user: &NewUser) -> AppResult<User>;
}

/// Book store
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Book>>;

    /// Fails with `AppError::NotFound` when no row has this id
    async fn get_by_id(&self, id: i32) -> AppResult<Book>;

    async fn create(&self, book: &NewBook) -> AppResult<Book>;

    /// Persist every mutable field of `book`, refreshing `updated_at`
    async fn update(&self, book: &Book) -> AppResult<Book>;

    /// Fails with `AppError::NotFound` when zero rows are affected
    async fn delete(&self, id: i32) -> AppResult<()>;
}

/// Main repository struct holding the resource stores
#[derive(Clone)]
pub struct Repository {
    pool: Option<Pool<Postgres>>,
    pub users: Arc<dyn UserStore>,
    pub books: Arc<dyn BookStore>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: Arc::new(users::UsersRepository::new(pool.clone())),
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Repository backed by process memory
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(memory::MemoryUsers::default()),
            books: Arc::new(memory::MemoryBooks::default()),
            pool: None,
        }
    }

    /// Check that the backing store answers
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}
