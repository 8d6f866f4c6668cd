//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → middleware/ (trace context, secure headers)
//!     → routes/ handlers (books CRUD)
//!     → error.rs (error → JSON response mapping)
//!     → send to client
//! ```

pub mod error;
pub mod extract;
pub mod middleware;
pub mod server;

pub use error::ApiError;
pub use server::HttpServer;
