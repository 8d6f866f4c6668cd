//! Firestore document-store adapter.
//!
//! Talks to the Firestore REST v1 API directly, authenticating with
//! access tokens from the GCE metadata server (the service account the
//! Cloud Run revision runs as). Tokens are cached until shortly before
//! they expire.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::store::{Book, BookStore, NewBook, StoreError, UpdateBook};

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Refresh tokens a minute before the metadata server says they expire.
const TOKEN_EXPIRY_SLACK: Duration = Duration::from_secs(60);

const COLLECTION: &str = "books";

pub struct Firestore {
    client: reqwest::Client,
    documents_url: String,
    token_url: String,
    token: RwLock<Option<CachedToken>>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

impl Firestore {
    pub fn new(project: &str) -> Self {
        Self::with_urls(
            format!(
                "https://firestore.googleapis.com/v1/projects/{project}/databases/(default)/documents"
            ),
            METADATA_TOKEN_URL.to_string(),
        )
    }

    fn with_urls(documents_url: String, token_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            documents_url,
            token_url,
            token: RwLock::new(None),
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/{COLLECTION}", self.documents_url)
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/{COLLECTION}/{id}", self.documents_url)
    }

    async fn access_token(&self) -> Result<String, StoreError> {
        if let Some(cached) = self.token.read().await.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.value.clone());
            }
        }

        let response = self
            .client
            .get(&self.token_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(backend)?
            .error_for_status()
            .map_err(backend)?;
        let token: TokenResponse = response.json().await.map_err(backend)?;

        let expires_at = Instant::now()
            + Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_SLACK);
        *self.token.write().await = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at,
        });
        Ok(token.access_token)
    }
}

#[async_trait]
impl BookStore for Firestore {
    async fn list_books(&self) -> Result<Vec<Book>, StoreError> {
        let token = self.access_token().await?;
        let mut books = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(self.collection_url()).bearer_auth(&token);
            if let Some(ref page) = page_token {
                request = request.query(&[("pageToken", page)]);
            }
            let response = request.send().await.map_err(backend)?;
            let status = response.status();
            if !status.is_success() {
                return Err(status_error(status, response).await);
            }

            let page: Value = response.json().await.map_err(backend)?;
            if let Some(documents) = page.get("documents").and_then(Value::as_array) {
                for doc in documents {
                    books.push(book_from_document(doc)?);
                }
            }
            page_token = page
                .get("nextPageToken")
                .and_then(Value::as_str)
                .map(String::from);
            if page_token.is_none() {
                return Ok(books);
            }
        }
    }

    async fn get_book(&self, id: &str) -> Result<Book, StoreError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(self.document_url(id))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(backend)?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(id.to_string())),
            status if status.is_success() => {
                let doc: Value = response.json().await.map_err(backend)?;
                book_from_document(&doc)
            }
            status => Err(status_error(status, response).await),
        }
    }

    async fn create_book(&self, payload: NewBook) -> Result<Book, StoreError> {
        let token = self.access_token().await?;
        let book = Book {
            id: Uuid::new_v4().to_string(),
            title: payload.title,
            author: payload.author,
        };

        let response = self
            .client
            .post(self.collection_url())
            .bearer_auth(&token)
            .query(&[("documentId", book.id.as_str())])
            .json(&document_fields(&book))
            .send()
            .await
            .map_err(backend)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response).await);
        }
        Ok(book)
    }

    async fn update_book(&self, id: &str, payload: UpdateBook) -> Result<(), StoreError> {
        // A patch without a field mask would replace the whole document;
        // an empty payload only needs the existence check.
        if payload.is_empty() {
            return self.get_book(id).await.map(|_| ());
        }

        let token = self.access_token().await?;
        let (fields, mask) = update_fields(&payload);

        let mut query: Vec<(&str, &str)> = vec![("currentDocument.exists", "true")];
        for path in &mask {
            query.push(("updateMask.fieldPaths", path));
        }

        let response = self
            .client
            .patch(self.document_url(id))
            .bearer_auth(&token)
            .query(&query)
            .json(&fields)
            .send()
            .await
            .map_err(backend)?;

        match response.status() {
            // The exists precondition surfaces as 404 or 409 depending on
            // the failure mode; both mean there is no such document.
            StatusCode::NOT_FOUND | StatusCode::CONFLICT => {
                Err(StoreError::NotFound(id.to_string()))
            }
            status if status.is_success() => Ok(()),
            status => Err(status_error(status, response).await),
        }
    }

    async fn delete_book(&self, id: &str) -> Result<(), StoreError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .delete(self.document_url(id))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(backend)?;

        let status = response.status();
        // Firestore deletes are idempotent; tolerate 404 for symmetry
        // with the in-memory store.
        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(status_error(status, response).await)
        }
    }
}

fn backend(err: reqwest::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

async fn status_error(status: StatusCode, response: reqwest::Response) -> StoreError {
    let body = response.text().await.unwrap_or_default();
    StoreError::Backend(format!("Firestore returned {status}: {body}"))
}

fn string_value(s: &str) -> Value {
    json!({ "stringValue": s })
}

/// Full document body for a create.
fn document_fields(book: &Book) -> Value {
    json!({
        "fields": {
            "id": string_value(&book.id),
            "title": string_value(&book.title),
            "author": string_value(&book.author),
        }
    })
}

/// Patch body plus field mask covering only the provided fields.
fn update_fields(payload: &UpdateBook) -> (Value, Vec<&'static str>) {
    let mut fields = Map::new();
    let mut mask = Vec::new();
    if let Some(ref title) = payload.title {
        fields.insert("title".to_string(), string_value(title));
        mask.push("title");
    }
    if let Some(ref author) = payload.author {
        fields.insert("author".to_string(), string_value(author));
        mask.push("author");
    }
    (json!({ "fields": Value::Object(fields) }), mask)
}

fn book_from_document(doc: &Value) -> Result<Book, StoreError> {
    let field = |name: &str| {
        doc.get("fields")
            .and_then(|fields| fields.get(name))
            .and_then(|field| field.get("stringValue"))
            .and_then(Value::as_str)
            .map(String::from)
    };

    // Documents written by this service carry their id as a field; fall
    // back to the resource name for anything written another way.
    let id = field("id")
        .or_else(|| {
            doc.get("name")
                .and_then(Value::as_str)
                .and_then(|name| name.rsplit('/').next())
                .map(String::from)
        })
        .ok_or_else(|| StoreError::Backend("document has no id".to_string()))?;
    let title = field("title")
        .ok_or_else(|| StoreError::Backend(format!("document '{id}' has no title field")))?;
    let author = field("author")
        .ok_or_else(|| StoreError::Backend(format!("document '{id}' has no author field")))?;

    Ok(Book { id, title, author })
}
