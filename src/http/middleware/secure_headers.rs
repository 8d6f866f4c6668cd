//! Security response headers.
//!
//! Appends a fixed set of hardening headers to every response and strips
//! `X-Powered-By`.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

const SECURE_HEADERS: &[(&str, &str)] = &[
    ("cross-origin-resource-policy", "same-origin"),
    ("cross-origin-opener-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    (
        "strict-transport-security",
        "max-age=15552000; includeSubDomains",
    ),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
];

pub async fn secure_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    for (name, value) in SECURE_HEADERS {
        headers.insert(*name, HeaderValue::from_static(value));
    }
    headers.remove("x-powered-by");
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    #[tokio::test]
    async fn headers_added_and_x_powered_by_stripped() {
        let app = Router::new()
            .route(
                "/",
                get(|| async {
                    ([("x-powered-by", "axum")], "ok")
                }),
            )
            .layer(axum::middleware::from_fn(secure_headers));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers.get("x-frame-options"),
            Some(&HeaderValue::from_static("SAMEORIGIN"))
        );
        assert_eq!(
            headers.get("strict-transport-security"),
            Some(&HeaderValue::from_static(
                "max-age=15552000; includeSubDomains"
            ))
        );
        assert_eq!(
            headers.get("x-content-type-options"),
            Some(&HeaderValue::from_static("nosniff"))
        );
        assert!(headers.get("x-powered-by").is_none());
    }
}
