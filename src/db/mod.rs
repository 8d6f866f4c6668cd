//! Document-store subsystem.
//!
//! # Data Flow
//! ```text
//! routes/books.rs handlers
//!     → BookStore trait (store.rs)
//!     → firestore.rs (Firestore REST v1, when a project is configured)
//!     → memory.rs   (in-process map, local development and tests)
//! ```
//!
//! # Design Decisions
//! - Handlers only see the `BookStore` trait; the adapter is chosen once
//!   at startup
//! - Deleting a non-existent book succeeds (idempotent delete)

pub mod firestore;
pub mod memory;
pub mod store;

pub use firestore::Firestore;
pub use memory::MemoryStore;
pub use store::{Book, BookStore, NewBook, StoreError, UpdateBook};
