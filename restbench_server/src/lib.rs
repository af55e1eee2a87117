//! Restbench Server - Request history service
//!
//! Persists every request dispatched by the restbench client and serves it
//! back as a paginated CRUD API under `/history`.

pub mod config;
pub mod routes;
pub mod service;
pub mod store;

pub use config::Config;
pub use routes::{build_router, AppState};
pub use service::{HistoryError, HistoryService};
pub use store::{MemoryStore, PgStore, Store, StoreError};
