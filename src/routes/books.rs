//! Books CRUD handlers.
//!
//! Thin request/response translation over the document store: every
//! handler is a single store call plus JSON shaping. Errors propagate to
//! the central mapper via `?`.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::db::store::{Book, NewBook, StoreError, UpdateBook};
use crate::http::error::ApiError;
use crate::http::extract::ApiJson;
use crate::http::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/{id}",
            get(get_book).post(update_book).delete(delete_book),
        )
}

#[derive(Debug, Serialize)]
struct BooksResponse {
    books: Vec<Book>,
    total: usize,
}

#[derive(Debug, Serialize)]
struct ResponseOk {
    message: &'static str,
}

impl ResponseOk {
    fn new() -> Self {
        Self { message: "ok" }
    }
}

/// GET /v1/books
async fn list_books(State(state): State<AppState>) -> Result<Json<BooksResponse>, ApiError> {
    let books = state.store.list_books().await?;
    let total = books.len();
    tracing::debug!(total, "listed books");
    Ok(Json(BooksResponse { books, total }))
}

/// POST /v1/books
async fn create_book(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewBook>,
) -> Result<Json<ResponseOk>, ApiError> {
    let book = state.store.create_book(payload).await?;
    tracing::debug!(id = %book.id, "created book");
    Ok(Json(ResponseOk::new()))
}

/// GET /v1/books/{id}
async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, ApiError> {
    let book = state.store.get_book(&id).await?;
    Ok(Json(book))
}

/// POST /v1/books/{id}
async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateBook>,
) -> Result<Json<ResponseOk>, ApiError> {
    state
        .store
        .update_book(&id, payload)
        .await
        .map_err(|err| match err {
            StoreError::NotFound(_) => {
                ApiError::not_found(format!("Error updating book. Reason: {err}"))
            }
            StoreError::Backend(_) => {
                ApiError::Internal(format!("Error updating book. Reason: {err}"))
            }
        })?;
    tracing::debug!(id = %id, "updated book");
    Ok(Json(ResponseOk::new()))
}

/// DELETE /v1/books/{id}
async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResponseOk>, ApiError> {
    state.store.delete_book(&id).await?;
    tracing::debug!(id = %id, "deleted book");
    Ok(Json(ResponseOk::new()))
}
