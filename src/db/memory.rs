//! In-memory document store.
//!
//! Backs local development and the test suite; behavior mirrors the
//! Firestore adapter, including idempotent deletes.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::store::{Book, BookStore, NewBook, StoreError, UpdateBook};

#[derive(Default)]
pub struct MemoryStore {
    books: RwLock<BTreeMap<String, Book>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn list_books(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.books.read().await.values().cloned().collect())
    }

    async fn get_book(&self, id: &str) -> Result<Book, StoreError> {
        self.books
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn create_book(&self, payload: NewBook) -> Result<Book, StoreError> {
        let book = Book {
            id: Uuid::new_v4().to_string(),
            title: payload.title,
            author: payload.author,
        };
        self.books
            .write()
            .await
            .insert(book.id.clone(), book.clone());
        Ok(book)
    }

    async fn update_book(&self, id: &str, payload: UpdateBook) -> Result<(), StoreError> {
        let mut books = self.books.write().await;
        let book = books
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if let Some(title) = payload.title {
            book.title = title;
        }
        if let Some(author) = payload.author {
            book.author = author;
        }
        Ok(())
    }

    async fn delete_book(&self, id: &str) -> Result<(), StoreError> {
        self.books.write().await.remove(id);
        Ok(())
    }
}
