//! Integration tests running statement groups against SQLite.
//!
//! These tests verify atomicity, version marker bookkeeping and failure
//! reporting end to end through a real database.

#![cfg(feature = "sqlite")]

use migrun::prelude::*;
use migrun::RunPhase;

async fn setup() -> (SqliteConnection, MigrationRunner<SqlDialect>) {
    let conn = SqliteConnection::memory().await.expect("open in-memory db");
    let dialect = SqlDialect::sqlite();
    conn.ensure_version_table(&dialect)
        .await
        .expect("create version table");
    (conn, MigrationRunner::quiet(dialect))
}

async fn versions(conn: &SqliteConnection) -> Vec<(i64, i64)> {
    let ids = conn
        .query_i64("SELECT version_id FROM migrun_db_version ORDER BY id", &[])
        .await
        .unwrap();
    let applied = conn
        .query_i64("SELECT is_applied FROM migrun_db_version ORDER BY id", &[])
        .await
        .unwrap();
    ids.into_iter().zip(applied).collect()
}

const CREATE_AND_INSERT: [&str; 2] = ["CREATE TABLE t(id int);", "INSERT INTO t VALUES(1);"];

/// Both statements applied, version (1, true) inserted, committed.
#[tokio::test]
async fn test_transactional_apply() {
    let (conn, runner) = setup().await;

    runner
        .run(&conn, &CREATE_AND_INSERT, 1, ExecutionMode::up())
        .await
        .expect("migration should succeed");

    assert_eq!(conn.query_i64("SELECT id FROM t", &[]).await.unwrap(), vec![1]);
    assert_eq!(versions(&conn).await, vec![(1, 1)]);
}

/// A failing second statement leaves neither the table nor a version row.
#[tokio::test]
async fn test_transactional_failure_is_atomic() {
    let (conn, runner) = setup().await;
    let statements = ["CREATE TABLE t(id int);", "INSERT INTO missing VALUES(1);"];

    let err = runner
        .run(&conn, &statements, 1, ExecutionMode::up())
        .await
        .unwrap_err();

    assert_eq!(err.phase(), RunPhase::Statement);
    assert_eq!(err.statement_text(), Some("INSERT INTO missing VALUES(1);"));
    assert!(err.cause().to_string().contains("no such table"));
    assert!(!conn.table_exists("t").await.unwrap());
    assert!(versions(&conn).await.is_empty());
}

/// Without a transaction, earlier statements stay and later ones never run.
#[tokio::test]
async fn test_non_transactional_failure_keeps_prefix() {
    let (conn, runner) = setup().await;
    let statements = [
        "CREATE TABLE a(id int);",
        "INSERT INTO missing VALUES(1);",
        "CREATE TABLE c(id int);",
    ];

    let err = runner
        .run(&conn, &statements, 2, ExecutionMode::up().transactional(false))
        .await
        .unwrap_err();

    assert_eq!(err.phase(), RunPhase::Statement);
    assert!(conn.table_exists("a").await.unwrap());
    assert!(!conn.table_exists("c").await.unwrap());
    assert!(versions(&conn).await.is_empty());
}

#[tokio::test]
async fn test_apply_then_revert() {
    let (conn, runner) = setup().await;

    runner.apply(&conn, &CREATE_AND_INSERT, 7, true).await.unwrap();
    assert_eq!(versions(&conn).await, vec![(7, 1)]);

    runner.revert(&conn, &["DROP TABLE t;"], 7, true).await.unwrap();
    assert!(!conn.table_exists("t").await.unwrap());
    assert!(versions(&conn).await.is_empty());
}

#[tokio::test]
async fn test_no_versioning_leaves_version_table_alone() {
    let (conn, runner) = setup().await;
    let mode = ExecutionMode::up().no_versioning(true);

    runner.run(&conn, &CREATE_AND_INSERT, 3, mode).await.unwrap();

    assert!(conn.table_exists("t").await.unwrap());
    assert!(versions(&conn).await.is_empty());
}

#[tokio::test]
async fn test_empty_group_records_version() {
    let (conn, runner) = setup().await;
    let empty: [&str; 0] = [];

    runner.run(&conn, &empty, 11, ExecutionMode::up()).await.unwrap();
    assert_eq!(versions(&conn).await, vec![(11, 1)]);
}

/// A missing version table fails the marker step and rolls back statements.
#[tokio::test]
async fn test_version_failure_rolls_back_statements() {
    let conn = SqliteConnection::memory().await.unwrap();
    let runner = MigrationRunner::quiet(SqlDialect::with_table(Backend::Sqlite, "no_such_table"));

    let err = runner
        .run(&conn, &CREATE_AND_INSERT, 1, ExecutionMode::up())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RunError::VersionRecordFailed {
            direction: Direction::Up,
            ..
        }
    ));
    assert!(!conn.table_exists("t").await.unwrap());
}

/// Deferred foreign keys are checked at COMMIT, so the commit itself fails.
#[tokio::test]
async fn test_commit_failure_is_reported() {
    let (conn, runner) = setup().await;
    conn.execute_batch(
        "CREATE TABLE parent (id INTEGER PRIMARY KEY);
         CREATE TABLE child (
             parent_id INTEGER REFERENCES parent(id) DEFERRABLE INITIALLY DEFERRED
         );",
    )
    .await
    .unwrap();

    let err = runner
        .run(
            &conn,
            &["INSERT INTO child (parent_id) VALUES (42);"],
            5,
            ExecutionMode::up(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.phase(), RunPhase::Commit);
    assert!(versions(&conn).await.is_empty());
    assert_eq!(
        conn.query_i64("SELECT COUNT(*) FROM child", &[]).await.unwrap(),
        vec![0]
    );
}

#[tokio::test]
async fn test_verbose_runner_against_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.db");

    let conn = SqliteConnection::open(SqliteConfig::file(&path)).await.unwrap();
    let dialect = SqlDialect::with_table(Backend::Sqlite, "schema_versions");
    conn.ensure_version_table(&dialect).await.unwrap();

    let config = RunnerConfig::new().verbose(true).color(false);
    let runner = MigrationRunner::new(dialect, &config);

    let statements = [
        "-- +migrate Up\nCREATE TABLE users (\n    id INTEGER PRIMARY KEY,\n\n    email TEXT\n);\n",
        "CREATE INDEX users_email_idx ON users (email);",
    ];
    runner.apply(&conn, &statements, 20240101120000, true).await.unwrap();
    conn.close().await.unwrap();

    let reopened = SqliteConnection::open_url(format!("sqlite://{}", path.display()))
        .await
        .unwrap();
    assert!(reopened.table_exists("users").await.unwrap());
    assert_eq!(
        reopened
            .query_i64("SELECT version_id FROM schema_versions", &[])
            .await
            .unwrap(),
        vec![20240101120000]
    );
}
