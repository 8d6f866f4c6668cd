//! HTTP middleware.
//!
//! # Responsibilities
//! - Trace-context extraction from inbound headers (trace_context.rs)
//! - Security response headers (secure_headers.rs)

pub mod secure_headers;
pub mod trace_context;

pub use secure_headers::secure_headers;
pub use trace_context::TraceContextLayer;
