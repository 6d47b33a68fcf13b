//! Book inventory service

use std::sync::Arc;

use crate::{
    error::AppResult,
    models::book::{Book, NewBook},
    repository::BookStore,
};

#[derive(Clone)]
pub struct BooksService {
    store: Arc<dyn BookStore>,
}

impl BooksService {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.store.list().await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        self.store.get_by_id(id).await
    }

    pub async fn create(&self, fields: NewBook) -> AppResult<Book> {
        let book = self.store.create(&fields).await?;
        tracing::info!(book_id = book.id, "created book");
        Ok(book)
    }

    /// Replace every mutable field of an existing book
    pub async fn update(&self, id: i32, fields: NewBook) -> AppResult<Book> {
        let mut book = self.store.get_by_id(id).await?;
        book.apply(fields);

        let updated = self.store.update(&book).await?;
        tracing::info!(book_id = id, "updated book");
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.store.delete(id).await?;
        tracing::info!(book_id = id, "deleted book");
        Ok(())
    }
}
