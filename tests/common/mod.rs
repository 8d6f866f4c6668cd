//! Shared utilities for integration testing.

use std::sync::Arc;

use tokio::net::TcpListener;

use books_api::config::Settings;
use books_api::db::store::BookStore;
use books_api::db::MemoryStore;
use books_api::HttpServer;

/// Start the full server (all middleware, in-memory store) on an
/// ephemeral port. Returns the base URL and the store for seeding.
pub async fn spawn_app() -> (String, Arc<MemoryStore>) {
    let settings = Settings::default();
    let store = Arc::new(MemoryStore::new());
    let server = HttpServer::new(&settings, store.clone() as Arc<dyn BookStore>);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = server.router();
    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .await
            .unwrap();
    });

    (format!("http://{addr}"), store)
}
