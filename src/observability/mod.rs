//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request headers
//!     → trace.rs (parse Traceparent / X-Cloud-Trace-Context)
//!     → propagation.rs (task-scoped current context)
//!     → logging.rs (Cloud Logging JSON records with trace fields)
//!
//! Consumers:
//!     → stdout, picked up by the Cloud Logging agent
//! ```
//!
//! # Design Decisions
//! - Correlation only: headers are parsed into identifiers for log
//!   records; no spans are created, sampled, or exported
//! - Header parsing never fails a request; worst case is a log record
//!   without trace fields

pub mod logging;
pub mod propagation;
pub mod trace;
