//! # migrun-core
//!
//! Migration execution engine for migrun.
//!
//! Given the ordered SQL statements of one migration version and a
//! direction, this crate:
//! - Runs them against a database, optionally inside a single transaction
//! - Inserts (up) or deletes (down) the version marker, atomically with the
//!   statements when transactional
//! - Reports progress for long-running statements without affecting them
//! - Strips comments and blank lines from statements shown in logs
//!
//! Deciding which migrations to run, parsing migration files and talking to
//! a concrete driver all happen outside this crate. Drivers plug in through
//! the [`Database`] / [`Transaction`] traits and version table SQL through
//! [`Dialect`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐  per statement  ┌────────────┐     ┌──────────────┐
//! │ MigrationRunner  │────────────────▶│ Watchdog   │────▶│ executor     │
//! └──────────────────┘                 └────────────┘     └──────────────┘
//!          │                                 │
//!          ▼                                 ▼
//!   ┌─────────────┐                   ┌─────────────┐
//!   │ Dialect     │                   │ Diagnostics │◀── sanitize()
//!   └─────────────┘                   └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use migrun_core::{ExecutionMode, MigrationRunner, RunnerConfig, SqlDialect};
//!
//! async fn apply(db: &impl migrun_core::Database) -> migrun_core::RunResult<()> {
//!     let config = RunnerConfig::from_env();
//!     let runner = MigrationRunner::new(SqlDialect::postgres(), &config);
//!
//!     let statements = [
//!         "CREATE TABLE users (id BIGINT PRIMARY KEY, email TEXT NOT NULL);",
//!         "CREATE UNIQUE INDEX users_email_idx ON users (email);",
//!     ];
//!
//!     runner
//!         .run(db, &statements, 20240101120000, ExecutionMode::up())
//!         .await
//! }
//! ```

pub mod config;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod logging;
pub mod runner;
pub mod sanitize;
pub mod watchdog;

// Re-exports
pub use config::{DEFAULT_PROGRESS_INTERVAL, DEFAULT_VERSION_TABLE, RunnerConfig};
pub use dialect::{Backend, Dialect, SqlDialect, UnknownDialect};
pub use error::{BoxError, RunError, RunPhase, RunResult};
pub use executor::{Database, StatementExecutor, Transaction, Value};
pub use logging::Diagnostics;
pub use runner::{Direction, ExecutionMode, MigrationRunner};
pub use sanitize::sanitize;
pub use watchdog::Watchdog;
