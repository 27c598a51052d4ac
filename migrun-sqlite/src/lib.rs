//! SQLite connection provider for migrun.
//!
//! This crate implements the `migrun-core` [`Database`](migrun_core::Database)
//! and [`Transaction`](migrun_core::Transaction) traits on top of
//! `tokio-rusqlite`, so a [`MigrationRunner`](migrun_core::MigrationRunner)
//! can run statement groups against a SQLite database.
//!
//! # Example
//!
//! ```rust,ignore
//! use migrun_core::{ExecutionMode, MigrationRunner, RunnerConfig, SqlDialect};
//! use migrun_sqlite::SqliteConnection;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let conn = SqliteConnection::open_url("sqlite://./app.db").await?;
//!     let dialect = SqlDialect::sqlite();
//!     conn.ensure_version_table(&dialect).await?;
//!
//!     let runner = MigrationRunner::new(dialect, &RunnerConfig::from_env());
//!     runner
//!         .run(&conn, &["CREATE TABLE users (id INTEGER PRIMARY KEY);"], 1, ExecutionMode::up())
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod types;

pub use config::{DatabasePath, JournalMode, SqliteConfig, SynchronousMode};
pub use connection::{SqliteConnection, SqliteTransaction};
pub use error::{SqliteError, SqliteResult};
