//! In-memory stores with the same contract as the Postgres repositories.
//!
//! Ids start at 1 and increase monotonically; uniqueness of username and
//! email is checked on insert, mirroring the unique indexes.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{BookStore, UserStore};
use crate::{
    error::{AppError, AppResult},
    models::{book::NewBook, user::NewUser, Book, User},
};

struct Table<T> {
    rows: Vec<T>,
    next_id: i32,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn lock<T>(table: &Mutex<Table<T>>) -> AppResult<MutexGuard<'_, Table<T>>> {
    table
        .lock()
        .map_err(|_| AppError::Internal("in-memory store lock poisoned".to_string()))
}

#[derive(Default)]
pub struct MemoryUsers {
    table: Mutex<Table<User>>,
}

#[async_trait]
impl UserStore for MemoryUsers {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let table = lock(&self.table)?;
        Ok(table.rows.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let table = lock(&self.table)?;
        Ok(table.rows.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, user: &NewUser) -> AppResult<User> {
        let mut table = lock(&self.table)?;

        if table
            .rows
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::Conflict("username or email already exists".to_string()));
        }

        let now = Utc::now();
        let created = User {
            id: table.allocate_id(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        table.rows.push(created.clone());
        Ok(created)
    }
}

#[derive(Default)]
pub struct MemoryBooks {
    table: Mutex<Table<Book>>,
}

#[async_trait]
impl BookStore for MemoryBooks {
    async fn list(&self) -> AppResult<Vec<Book>> {
        Ok(lock(&self.table)?.rows.clone())
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        lock(&self.table)?
            .rows
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("book not found".to_string()))
    }

    async fn create(&self, book: &NewBook) -> AppResult<Book> {
        let mut table = lock(&self.table)?;
        let now = Utc::now();
        let created = Book {
            id: table.allocate_id(),
            name: book.name.clone(),
            genre: book.genre.clone(),
            author: book.author.clone(),
            published_date: book.published_date.clone(),
            stock: book.stock,
            price: book.price,
            created_at: now,
            updated_at: now,
        };
        table.rows.push(created.clone());
        Ok(created)
    }

    async fn update(&self, book: &Book) -> AppResult<Book> {
        let mut table = lock(&self.table)?;
        let stored = table
            .rows
            .iter_mut()
            .find(|b| b.id == book.id)
            .ok_or_else(|| AppError::NotFound("book not found".to_string()))?;

        *stored = Book {
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..book.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut table = lock(&self.table)?;
        let before = table.rows.len();
        table.rows.retain(|b| b.id != id);
        if table.rows.len() == before {
            return Err(AppError::NotFound("book not found".to_string()));
        }
        Ok(())
    }
}
