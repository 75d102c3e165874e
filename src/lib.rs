//! # Tablekeep
//!
//! A self-hosted database administration service. Every user edits tables in
//! a private namespace (`u<id>_<name>`); administrators additionally manage the
//! `users` table. Table schemas are discovered at runtime, so any table can be
//! listed and edited without code changes.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! tablekeep = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tablekeep::config::ServerConfig;
//! use tablekeep::server::{AppState, create_router};
//! use tablekeep::store::{SqliteStore, Store};
//!
//! let config = ServerConfig::default();
//! let store = SqliteStore::new(config.db_path()).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store), &config));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `tablekeep` binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
