//! Books API service library.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                  BOOKS API                   │
//!                    │                                              │
//!   Client Request   │  ┌───────────┐   ┌──────────┐   ┌─────────┐ │
//!   ─────────────────┼─▶│  http     │──▶│  routes  │──▶│   db    │─┼──▶ Firestore
//!                    │  │ middleware│   │  books   │   │ adapter │ │    (or memory)
//!                    │  └─────┬─────┘   └────┬─────┘   └─────────┘ │
//!                    │        │              │                     │
//!                    │        ▼              ▼                     │
//!                    │  ┌─────────────────────────────┐            │
//!                    │  │        observability        │            │
//!                    │  │ trace parse → propagation → │            │
//!                    │  │ Cloud Logging JSON records  │            │
//!                    │  └─────────────────────────────┘            │
//!   Client Response  │  ┌──────────────┐                           │
//!   ◀────────────────┼──│ error mapper │◀── handler errors         │
//!                    │  └──────────────┘                           │
//!                    └──────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod db;
pub mod http;
pub mod routes;

// Cross-cutting concerns
pub mod observability;

pub use config::Settings;
pub use http::HttpServer;
