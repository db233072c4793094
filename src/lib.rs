//! Store Tag API
//!
//! Stores, items and tags behind a JWT-guarded REST API.
//!
//! # Modules
//!
//! - [`config`] - YAML configuration with environment overrides
//! - [`logging`] - tracing subscriber setup
//! - [`models`] - Persisted entities
//! - [`db`] - PostgreSQL pool and migrations
//! - [`store`] - `DataStore` trait with Postgres and in-memory backends
//! - [`user_auth`] - Password hashing, JWT issuance, revocation, auth middleware
//! - [`gateway`] - axum router, handlers, OpenAPI

pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod store;
pub mod user_auth;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use gateway::{build_router, run_server, state::AppState};
pub use store::{DataStore, MemoryStore, PgStore, StoreError};
