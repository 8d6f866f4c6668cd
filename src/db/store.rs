//! Book records and the document-store trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A book document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
}

/// Payload for creating a book. The id is generated server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
}

/// Partial update: only the provided fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl UpdateBook {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none()
    }
}

/// Errors surfaced by a document-store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Book with ID '{0}' not found")]
    NotFound(String),

    #[error("datastore request failed: {0}")]
    Backend(String),
}

/// Collection operations on the `books` collection.
///
/// Implementations must keep delete idempotent: deleting an id that does
/// not exist is a success.
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn list_books(&self) -> Result<Vec<Book>, StoreError>;

    async fn get_book(&self, id: &str) -> Result<Book, StoreError>;

    async fn create_book(&self, payload: NewBook) -> Result<Book, StoreError>;

    async fn update_book(&self, id: &str, payload: UpdateBook) -> Result<(), StoreError>;

    async fn delete_book(&self, id: &str) -> Result<(), StoreError>;
}
