//! Version table SQL per database backend.
//!
//! The runner treats these statements as opaque text with positional
//! parameters:
//!
//! - insert: `(version_id, is_applied)`
//! - delete: `(version_id)`
//!
//! Applications with their own version table implement [`Dialect`] directly.
//! [`SqlDialect`] covers the common backends with a configurable table name.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::config::{DEFAULT_VERSION_TABLE, RunnerConfig};

/// Backend-specific SQL for the version tracking table.
pub trait Dialect: Send + Sync {
    /// Statement inserting a marker. Parameters: `(version, is_applied)`.
    fn insert_version_sql(&self) -> String;

    /// Statement deleting a marker. Parameter: `(version)`.
    fn delete_version_sql(&self) -> String;

    /// Statement creating the version table.
    fn create_version_table_sql(&self) -> String;
}

impl<D: Dialect + ?Sized> Dialect for &D {
    fn insert_version_sql(&self) -> String {
        (**self).insert_version_sql()
    }

    fn delete_version_sql(&self) -> String {
        (**self).delete_version_sql()
    }

    fn create_version_table_sql(&self) -> String {
        (**self).create_version_table_sql()
    }
}

impl<D: Dialect + ?Sized> Dialect for Box<D> {
    fn insert_version_sql(&self) -> String {
        (**self).insert_version_sql()
    }

    fn delete_version_sql(&self) -> String {
        (**self).delete_version_sql()
    }

    fn create_version_table_sql(&self) -> String {
        (**self).create_version_table_sql()
    }
}

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// PostgreSQL.
    Postgres,
    /// MySQL / MariaDB.
    MySql,
    /// SQLite.
    Sqlite,
    /// Microsoft SQL Server.
    SqlServer,
    /// Amazon Redshift.
    Redshift,
    /// TiDB.
    TiDb,
    /// ClickHouse.
    ClickHouse,
    /// Vertica.
    Vertica,
}

impl Backend {
    /// Canonical backend name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite3",
            Self::SqlServer => "mssql",
            Self::Redshift => "redshift",
            Self::TiDb => "tidb",
            Self::ClickHouse => "clickhouse",
            Self::Vertica => "vertica",
        }
    }

    /// Positional placeholder for the 1-based parameter `n`.
    fn placeholder(&self, n: usize) -> String {
        match self {
            Self::Postgres | Self::Redshift | Self::ClickHouse => format!("${}", n),
            Self::SqlServer => format!("@p{}", n),
            Self::MySql | Self::Sqlite | Self::TiDb | Self::Vertica => "?".to_string(),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized backend name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown dialect: {0:?}")]
pub struct UnknownDialect(pub String);

impl FromStr for Backend {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pgx" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "mssql" | "sqlserver" => Ok(Self::SqlServer),
            "redshift" => Ok(Self::Redshift),
            "tidb" => Ok(Self::TiDb),
            "clickhouse" => Ok(Self::ClickHouse),
            "vertica" => Ok(Self::Vertica),
            other => Err(UnknownDialect(other.to_string())),
        }
    }
}

/// Built-in [`Dialect`] for a [`Backend`] and table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlDialect {
    backend: Backend,
    table: String,
}

impl SqlDialect {
    /// Dialect using the default version table.
    pub fn new(backend: Backend) -> Self {
        Self::with_table(backend, DEFAULT_VERSION_TABLE)
    }

    /// Dialect using a custom version table.
    pub fn with_table(backend: Backend, table: impl Into<String>) -> Self {
        Self {
            backend,
            table: table.into(),
        }
    }

    /// Dialect using the table configured in `config`.
    pub fn from_config(backend: Backend, config: &RunnerConfig) -> Self {
        Self::with_table(backend, config.table_name.clone())
    }

    /// PostgreSQL dialect with the default table.
    pub fn postgres() -> Self {
        Self::new(Backend::Postgres)
    }

    /// MySQL dialect with the default table.
    pub fn mysql() -> Self {
        Self::new(Backend::MySql)
    }

    /// SQLite dialect with the default table.
    pub fn sqlite() -> Self {
        Self::new(Backend::Sqlite)
    }

    /// The backend.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// The version table name.
    pub fn table_name(&self) -> &str {
        &self.table
    }
}

impl Dialect for SqlDialect {
    fn insert_version_sql(&self) -> String {
        let b = self.backend;
        let terminator = if b == Backend::ClickHouse { "" } else { ";" };
        format!(
            "INSERT INTO {} (version_id, is_applied) VALUES ({}, {}){}",
            self.table,
            b.placeholder(1),
            b.placeholder(2),
            terminator
        )
    }

    fn delete_version_sql(&self) -> String {
        let p = self.backend.placeholder(1);
        match self.backend {
            Backend::ClickHouse => format!(
                "ALTER TABLE {} DELETE WHERE version_id = {} SETTINGS mutations_sync = 2",
                self.table, p
            ),
            _ => format!("DELETE FROM {} WHERE version_id={};", self.table, p),
        }
    }

    fn create_version_table_sql(&self) -> String {
        let t = &self.table;
        match self.backend {
            Backend::Postgres | Backend::MySql => format!(
                "CREATE TABLE {} (\n    id serial NOT NULL,\n    version_id bigint NOT NULL,\n    \
                 is_applied boolean NOT NULL,\n    tstamp timestamp NULL default now(),\n    \
                 PRIMARY KEY(id)\n);",
                t
            ),
            Backend::Sqlite => format!(
                "CREATE TABLE {} (\n    id INTEGER PRIMARY KEY AUTOINCREMENT,\n    \
                 version_id INTEGER NOT NULL,\n    is_applied INTEGER NOT NULL,\n    \
                 tstamp TIMESTAMP DEFAULT (datetime('now'))\n);",
                t
            ),
            Backend::SqlServer => format!(
                "CREATE TABLE {} (\n    id INT NOT NULL IDENTITY(1,1) PRIMARY KEY,\n    \
                 version_id BIGINT NOT NULL,\n    is_applied BIT NOT NULL,\n    \
                 tstamp DATETIME NULL DEFAULT CURRENT_TIMESTAMP\n);",
                t
            ),
            Backend::Redshift => format!(
                "CREATE TABLE {} (\n    id integer NOT NULL identity(1, 1),\n    \
                 version_id bigint NOT NULL,\n    is_applied boolean NOT NULL,\n    \
                 tstamp timestamp NULL default sysdate,\n    PRIMARY KEY(id)\n);",
                t
            ),
            Backend::TiDb => format!(
                "CREATE TABLE {} (\n    id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT UNIQUE,\n    \
                 version_id bigint NOT NULL,\n    is_applied boolean NOT NULL,\n    \
                 tstamp timestamp NULL default now(),\n    PRIMARY KEY(id)\n);",
                t
            ),
            Backend::ClickHouse => format!(
                "CREATE TABLE IF NOT EXISTS {} (\n    version_id Int64,\n    is_applied UInt8,\n    \
                 date Date default now(),\n    tstamp DateTime default now()\n)\n\
                 ENGINE = MergeTree()\n    ORDER BY (date)",
                t
            ),
            Backend::Vertica => format!(
                "CREATE TABLE {} (\n    id identity(1,1) NOT NULL,\n    version_id bigint NOT NULL,\n    \
                 is_applied boolean NOT NULL,\n    tstamp timestamp NULL default now(),\n    \
                 PRIMARY KEY(id)\n);",
                t
            ),
        }
    }
}
