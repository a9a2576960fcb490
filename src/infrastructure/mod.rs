//! Infrastructure layer - Framework implementations
//!
//! This layer contains:
//! - SQLite connection and schema bootstrap (db)
//! - Router assembly and listener (server)
//! - Environment and profile configuration (config)
//! - JWT and password handling, request extractors (auth)
//! - SeaORM repositories (repositories)
//! - Shared handles and per-book write locks (state)
//! - Demo accounts and books (seed)
//! - Cover image files (storage)

pub mod auth;
pub mod config;
pub mod db;
pub mod repositories;
pub mod seed;
pub mod server;
pub mod state;
pub mod storage;

pub use repositories::*;
pub use state::AppState;
