//! Centralized error-to-response mapping.
//!
//! # Responsibilities
//! - Convert every handler error into a JSON `{"message": ...}` response
//! - Log mapped errors (404s excepted, to keep routine lookups quiet)
//! - Omit the body entirely for statuses that forbid one
//!
//! # Design Decisions
//! - One tagged error type with an exhaustive match: handlers never
//!   format error responses themselves
//! - Stack traces and internal detail stay in the server-side log line,
//!   never in the wire response

use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::db::store::StoreError;

/// One entry in a validation-failure detail list.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidationDetail {
    /// Where the offending input lives, e.g. `["body", "title"]`.
    pub loc: Vec<String>,
    pub msg: String,
}

/// Everything a handler can fail with, by response category.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request input failed validation: 400 with a detail list.
    #[error("request validation failed")]
    Validation(Vec<ValidationDetail>),

    /// An error that declared its own HTTP status (not-found and friends).
    #[error("{message}")]
    Http {
        status: StatusCode,
        message: String,
        /// Headers the originating error wants echoed on the response.
        headers: Option<HeaderMap>,
    },

    /// Anything unhandled: 500 with the stringified cause.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::Http {
            status,
            message: message.into(),
            headers: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::http(StatusCode::NOT_FOUND, message)
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Http { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(vec![ValidationDetail {
            loc: vec!["body".to_string()],
            msg: rejection.body_text(),
        }])
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::not_found(err.to_string()),
            StoreError::Backend(message) => ApiError::Internal(message),
        }
    }
}

/// Statuses that must not carry a body.
fn forbids_body(status: StatusCode) -> bool {
    status.as_u16() < 200
        || matches!(
            status,
            StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT | StatusCode::NOT_MODIFIED
        )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (message, headers): (Value, Option<HeaderMap>) = match self {
            ApiError::Validation(details) => {
                let details = json!(details);
                tracing::error!(
                    status = status.as_u16(),
                    "request validation failed: {details}"
                );
                (details, None)
            }
            ApiError::Http {
                message, headers, ..
            } => {
                // 404s are routine lookups; logging them would drown out
                // real errors.
                if status != StatusCode::NOT_FOUND {
                    tracing::error!(status = status.as_u16(), "{message}");
                }
                (json!(message), headers)
            }
            ApiError::Internal(message) => {
                tracing::error!(status = status.as_u16(), "unhandled error: {message}");
                (json!(message), None)
            }
        };

        let mut response = if forbids_body(status) {
            status.into_response()
        } else {
            (status, Json(json!({ "message": message }))).into_response()
        };
        if let Some(headers) = headers {
            response.headers_mut().extend(headers);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    async fn body_json(response: Response) -> Option<Value> {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        if bytes.is_empty() {
            None
        } else {
            Some(serde_json::from_slice(&bytes).unwrap())
        }
    }

    fn detail(loc: &str, msg: &str) -> ValidationDetail {
        ValidationDetail {
            loc: vec!["body".to_string(), loc.to_string()],
            msg: msg.to_string(),
        }
    }

    #[tokio::test]
    async fn validation_error_lists_every_detail() {
        let err = ApiError::Validation(vec![
            detail("title", "field required"),
            detail("author", "field required"),
        ]);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await.unwrap();
        let details = body["message"].as_array().unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0]["loc"], json!(["body", "title"]));
    }

    #[tokio::test]
    async fn declared_status_is_preserved() {
        let response = ApiError::not_found("Book with ID 'x' not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await.unwrap();
        assert_eq!(body["message"], json!("Book with ID 'x' not found"));
    }

    #[tokio::test]
    async fn unhandled_error_becomes_500() {
        let response = ApiError::Internal("foo".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await.unwrap();
        assert_eq!(body["message"], json!("foo"));
    }

    #[tokio::test]
    async fn body_forbidding_statuses_stay_empty() {
        for status in [
            StatusCode::CONTINUE,
            StatusCode::NO_CONTENT,
            StatusCode::RESET_CONTENT,
            StatusCode::NOT_MODIFIED,
        ] {
            let response = ApiError::http(status, "ignored").into_response();
            assert_eq!(response.status(), status);
            assert!(body_json(response).await.is_none());
        }
    }

    #[tokio::test]
    async fn originating_headers_pass_through() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("30"));
        let err = ApiError::Http {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "busy".to_string(),
            headers: Some(headers),
        };
        let response = err.into_response();
        assert_eq!(
            response.headers().get("retry-after"),
            Some(&HeaderValue::from_static("30"))
        );
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn not_found_is_mapped_without_logging() {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(capture.clone()),
        );

        tracing::subscriber::with_default(subscriber, || {
            let response = ApiError::not_found("Book with ID 'x' not found").into_response();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            let response =
                ApiError::http(StatusCode::SERVICE_UNAVAILABLE, "busy").into_response();
            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        });

        // Only the 503 reaches the log; routine 404 lookups stay quiet.
        let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert!(!output.contains("not found"));
        assert!(output.contains("ERROR"));
        assert!(output.contains("busy"));
    }

    #[tokio::test]
    async fn store_errors_map_by_category() {
        let err: ApiError = StoreError::NotFound("42".to_string()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Book with ID '42' not found");

        let err: ApiError = StoreError::Backend("connection reset".to_string()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
