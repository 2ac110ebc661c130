//! # chime-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `chime-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `chime-app` (for port traits) and `chime-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod history_repo;
pub mod pool;
pub mod rule_repo;

pub use history_repo::SqliteHistoryRepository;
pub use pool::{Config, Database};
pub use rule_repo::SqliteRuleRepository;
