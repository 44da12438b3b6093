//! # tyloo-store
//!
//! Concrete `Repository` implementations for `tyloo-core`: an in-memory
//! backend for tests and single-process use, and a `sqlx`-backed
//! Postgres backend for crash-safe persistence.

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "sqlx-postgres")]
pub mod sqlx_repo;

#[cfg(feature = "sqlx-sqlite")]
pub mod sqlx_sqlite;

#[cfg(feature = "memory")]
pub use memory::InMemoryRepository;

#[cfg(feature = "sqlx-postgres")]
pub use sqlx_repo::SqlxRepository;

#[cfg(feature = "sqlx-sqlite")]
pub use sqlx_sqlite::SqliteRepository;
