//! # migrun
//!
//! Transactional execution of SQL migration statement groups.
//!
//! migrun runs the ordered statements of one migration version, records or
//! removes the version marker, and keeps the two consistent:
//! - Optional single-transaction runs with all-or-nothing semantics
//! - Version markers written atomically with the statements that earned them
//! - Periodic progress notices for long-running statements, never aborting them
//! - Comment-free statement text in logs and errors
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use migrun::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     migrun::logging::init();
//!
//!     let conn = SqliteConnection::open_url("sqlite://./app.db").await?;
//!     let dialect = SqlDialect::sqlite();
//!     conn.ensure_version_table(&dialect).await?;
//!
//!     let runner = MigrationRunner::new(dialect, &RunnerConfig::from_env());
//!     let up = [
//!         "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL);",
//!         "CREATE UNIQUE INDEX users_email_idx ON users (email);",
//!     ];
//!     runner.apply(&conn, &up, 20240101120000, true).await?;
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use migrun_core::{
    config, dialect, error, executor, logging, runner, sanitize, watchdog,
};

/// SQLite connection provider.
#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
pub mod sqlite {
    pub use migrun_sqlite::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use migrun_core::{
        Backend, Database, Diagnostics, Dialect, Direction, ExecutionMode, MigrationRunner,
        RunError, RunResult, RunnerConfig, SqlDialect, StatementExecutor, Transaction, Value,
        Watchdog,
    };

    #[cfg(feature = "sqlite")]
    pub use migrun_sqlite::{SqliteConfig, SqliteConnection, SqliteTransaction};
}

// Re-export key types at the crate root
pub use migrun_core::{
    Direction, ExecutionMode, MigrationRunner, RunError, RunPhase, RunResult, RunnerConfig,
};
