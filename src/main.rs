use std::sync::Arc;

use tokio::net::TcpListener;

use books_api::config::Settings;
use books_api::db::store::BookStore;
use books_api::db::{Firestore, MemoryStore};
use books_api::observability::logging;
use books_api::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    logging::init(&settings);

    tracing::info!(
        name = %settings.name,
        version = settings.version.as_deref().unwrap_or("unset"),
        "books-api starting"
    );

    // A configured project selects the Firestore adapter; without one
    // (local development) state lives in process memory.
    let store: Arc<dyn BookStore> = match settings.project.as_deref() {
        Some(project) => {
            tracing::info!(project = %project, "using Firestore document store");
            Arc::new(Firestore::new(project))
        }
        None => {
            tracing::warn!("no PROJECT configured; using in-memory document store");
            Arc::new(MemoryStore::new())
        }
    };

    let listener = TcpListener::bind(settings.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(&settings, store);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
