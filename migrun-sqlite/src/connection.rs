//! SQLite connection and transaction handles.
//!
//! Both handles wrap a `tokio_rusqlite::Connection`, which owns one SQLite
//! connection on a background thread. Cloning a handle clones the channel to
//! that thread, not the connection: a transaction started through any clone
//! covers statements sent through every clone until it is committed or
//! rolled back.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use migrun_core::{Database, SqlDialect, StatementExecutor, Transaction, Value};
use tokio_rusqlite::Connection;
use tracing::{debug, info, trace, warn};

use crate::config::{DatabasePath, SqliteConfig};
use crate::error::{SqliteError, SqliteResult};
use crate::types::to_sqlite_params;

/// A SQLite connection usable as a migration [`Database`].
#[derive(Clone)]
pub struct SqliteConnection {
    conn: Connection,
    path: DatabasePath,
}

impl SqliteConnection {
    /// Open a connection and run the configuration's pragmas.
    pub async fn open(config: SqliteConfig) -> SqliteResult<Self> {
        let conn = match &config.path {
            DatabasePath::Memory => Connection::open_in_memory().await?,
            DatabasePath::File(path) => Connection::open(path).await?,
        };

        let init_sql = config.init_sql();
        conn.call(move |conn| {
            conn.execute_batch(&init_sql)?;
            Ok(())
        })
        .await?;

        info!(path = %config.path.display(), "SQLite connection opened");

        Ok(Self {
            conn,
            path: config.path,
        })
    }

    /// Open a connection from a URL, see [`SqliteConfig::from_url`].
    pub async fn open_url(url: impl AsRef<str>) -> SqliteResult<Self> {
        Self::open(SqliteConfig::from_url(url)?).await
    }

    /// Open a private in-memory database.
    pub async fn memory() -> SqliteResult<Self> {
        Self::open(SqliteConfig::memory()).await
    }

    /// Location of the database.
    pub fn path(&self) -> &DatabasePath {
        &self.path
    }

    /// Get the inner connection.
    pub fn inner(&self) -> &Connection {
        &self.conn
    }

    /// Execute one or more statements without parameters.
    pub async fn execute_batch(&self, sql: &str) -> SqliteResult<()> {
        let sql = sql.to_string();
        debug!(sql = %sql, "Executing batch");

        self.conn
            .call(move |conn| Ok(conn.execute_batch(&sql)?))
            .await
            .map_err(SqliteError::from)
    }

    /// Query the first column of every row as an integer.
    pub async fn query_i64(&self, sql: &str, args: &[Value]) -> SqliteResult<Vec<i64>> {
        let sql = sql.to_string();
        let params = to_sqlite_params(args);
        debug!(sql = %sql, "Executing integer query");

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let params_ref: Vec<&dyn rusqlite::ToSql> = params
                    .iter()
                    .map(|v| v as &dyn rusqlite::ToSql)
                    .collect();
                let rows = stmt.query_map(params_ref.as_slice(), |row| row.get::<_, i64>(0))?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            })
            .await
            .map_err(SqliteError::from)
    }

    /// Check whether a table exists.
    pub async fn table_exists(&self, table: &str) -> SqliteResult<bool> {
        let found = self
            .query_i64(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
                &[Value::from(table)],
            )
            .await?;
        Ok(found.first().copied().unwrap_or(0) > 0)
    }

    /// Create the dialect's version table if it is missing.
    ///
    /// Returns `true` if the table was created.
    pub async fn ensure_version_table(&self, dialect: &SqlDialect) -> SqliteResult<bool> {
        use migrun_core::Dialect;

        if self.table_exists(dialect.table_name()).await? {
            return Ok(false);
        }

        self.execute_batch(&dialect.create_version_table_sql()).await?;
        info!(table = %dialect.table_name(), "Created version table");
        Ok(true)
    }

    /// Close the connection, waiting for pending calls to finish.
    pub async fn close(self) -> SqliteResult<()> {
        self.conn.close().await.map_err(SqliteError::from)
    }
}

/// Run a single statement on the connection thread.
///
/// Parameterless statements go through `execute_batch` so comment-only
/// tails and row-returning statements (e.g. `PRAGMA`) are accepted.
async fn execute_on(conn: &Connection, sql: &str, args: &[Value]) -> SqliteResult<()> {
    let sql = sql.to_string();
    let params = to_sqlite_params(args);
    debug!(sql = %sql, params = params.len(), "Executing statement");

    conn.call(move |conn| {
        if params.is_empty() {
            conn.execute_batch(&sql)?;
        } else {
            let params_ref: Vec<&dyn rusqlite::ToSql> = params
                .iter()
                .map(|v| v as &dyn rusqlite::ToSql)
                .collect();
            conn.execute(&sql, params_ref.as_slice())?;
        }
        Ok(())
    })
    .await
    .map_err(SqliteError::from)
}

#[async_trait::async_trait]
impl StatementExecutor for SqliteConnection {
    type Error = SqliteError;

    async fn execute(&self, sql: &str, args: &[Value]) -> Result<(), SqliteError> {
        execute_on(&self.conn, sql, args).await
    }
}

#[async_trait::async_trait]
impl Database for SqliteConnection {
    type Transaction = SqliteTransaction;

    async fn begin(&self) -> Result<SqliteTransaction, SqliteError> {
        trace!("BEGIN");
        self.conn
            .call(|conn| Ok(conn.execute_batch("BEGIN")?))
            .await?;

        Ok(SqliteTransaction {
            conn: self.conn.clone(),
            finished: Arc::new(AtomicBool::new(false)),
        })
    }
}

/// An open SQLite transaction.
///
/// Dropping every clone without calling [`Transaction::commit`] or
/// [`Transaction::rollback`] leaves the transaction open on the connection.
#[derive(Clone)]
pub struct SqliteTransaction {
    conn: Connection,
    finished: Arc<AtomicBool>,
}

impl SqliteTransaction {
    fn finish(&self) -> SqliteResult<()> {
        if self.finished.swap(true, Ordering::SeqCst) {
            return Err(SqliteError::transaction("transaction already finished"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl StatementExecutor for SqliteTransaction {
    type Error = SqliteError;

    async fn execute(&self, sql: &str, args: &[Value]) -> Result<(), SqliteError> {
        if self.finished.load(Ordering::SeqCst) {
            return Err(SqliteError::transaction("transaction already finished"));
        }
        execute_on(&self.conn, sql, args).await
    }
}

#[async_trait::async_trait]
impl Transaction for SqliteTransaction {
    async fn commit(self) -> Result<(), SqliteError> {
        self.finish()?;
        trace!("COMMIT");
        self.conn
            .call(|conn| match conn.execute_batch("COMMIT") {
                Ok(()) => Ok(()),
                Err(err) => {
                    // a failed COMMIT can leave the transaction open; close it
                    if !conn.is_autocommit() {
                        let _ = conn.execute_batch("ROLLBACK");
                    }
                    Err(err.into())
                }
            })
            .await
            .map_err(SqliteError::from)
    }

    async fn rollback(self) -> Result<(), SqliteError> {
        self.finish()?;
        trace!("ROLLBACK");
        self.conn
            .call(|conn| Ok(conn.execute_batch("ROLLBACK")?))
            .await
            .map_err(SqliteError::from)
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if Arc::strong_count(&self.finished) == 1 && !self.finished.load(Ordering::SeqCst) {
            warn!("SQLite transaction dropped without commit or rollback");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_memory() {
        let conn = SqliteConnection::memory().await.unwrap();
        assert!(conn.path().is_memory());
        assert!(!conn.table_exists("anything").await.unwrap());
    }

    #[tokio::test]
    async fn test_execute_with_params() {
        let conn = SqliteConnection::memory().await.unwrap();
        conn.execute("CREATE TABLE t (id INTEGER, flag INTEGER)", &[])
            .await
            .unwrap();
        conn.execute(
            "INSERT INTO t (id, flag) VALUES (?, ?)",
            &[Value::Int(3), Value::Bool(true)],
        )
        .await
        .unwrap();

        let rows = conn.query_i64("SELECT id + flag FROM t", &[]).await.unwrap();
        assert_eq!(rows, vec![4]);
    }

    #[tokio::test]
    async fn test_commented_statement_executes() {
        let conn = SqliteConnection::memory().await.unwrap();
        conn.execute("-- create\nCREATE TABLE t (id INTEGER);\n\n", &[])
            .await
            .unwrap();
        assert!(conn.table_exists("t").await.unwrap());
    }

    #[tokio::test]
    async fn test_transaction_commit_and_rollback() {
        let conn = SqliteConnection::memory().await.unwrap();

        let tx = conn.begin().await.unwrap();
        tx.execute("CREATE TABLE kept (id INTEGER)", &[]).await.unwrap();
        tx.commit().await.unwrap();
        assert!(conn.table_exists("kept").await.unwrap());

        let tx = conn.begin().await.unwrap();
        tx.execute("CREATE TABLE dropped (id INTEGER)", &[]).await.unwrap();
        tx.rollback().await.unwrap();
        assert!(!conn.table_exists("dropped").await.unwrap());
    }

    #[tokio::test]
    async fn test_finished_transaction_rejects_statements() {
        let conn = SqliteConnection::memory().await.unwrap();
        let tx = conn.begin().await.unwrap();
        let clone = tx.clone();
        tx.commit().await.unwrap();

        let err = clone.execute("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, SqliteError::Transaction(_)));
        assert!(matches!(
            clone.rollback().await,
            Err(SqliteError::Transaction(_))
        ));
    }

    #[tokio::test]
    async fn test_ensure_version_table() {
        let conn = SqliteConnection::memory().await.unwrap();
        let dialect = SqlDialect::sqlite();

        assert!(conn.ensure_version_table(&dialect).await.unwrap());
        assert!(!conn.ensure_version_table(&dialect).await.unwrap());
        assert!(conn.table_exists("migrun_db_version").await.unwrap());
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persist.db");

        let conn = SqliteConnection::open(SqliteConfig::file(&path)).await.unwrap();
        conn.execute("CREATE TABLE t (id INTEGER)", &[]).await.unwrap();
        conn.close().await.unwrap();

        let reopened = SqliteConnection::open(SqliteConfig::file(&path)).await.unwrap();
        assert!(!reopened.path().is_memory());
        assert!(reopened.table_exists("t").await.unwrap());
    }

    #[tokio::test]
    async fn test_sql_error_surfaces() {
        let conn = SqliteConnection::memory().await.unwrap();
        let err = conn
            .execute("INSERT INTO missing VALUES (1)", &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no such table"));
        assert!(err.as_rusqlite().is_some());
    }
}
