//! Migration runner.
//!
//! Runs the statement group of one migration version in one direction, then
//! records (up) or removes (down) the version marker.
//!
//! ```text
//!  begin? ──▶ stmt 1 ──▶ stmt 2 ──▶ … ──▶ version marker ──▶ commit?
//!                │          │                  │
//!                └──────────┴──── error ───────┴──▶ rollback? ──▶ Err
//! ```
//!
//! Every call goes through the [`Watchdog`]. In transactional mode a failure
//! at any step after `begin` rolls the whole run back, so either all
//! statements and the marker are visible afterwards or none are. Without a
//! transaction each statement commits on its own and a failure stops the run
//! where it is.

use std::fmt;

use tracing::{debug, instrument, warn};

use crate::config::RunnerConfig;
use crate::dialect::Dialect;
use crate::error::{RunError, RunResult};
use crate::executor::{Database, StatementExecutor, Transaction, Value};
use crate::logging::Diagnostics;
use crate::sanitize::sanitize;
use crate::watchdog::Watchdog;

/// Direction of a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Apply the migration and insert its version marker.
    #[default]
    Up,
    /// Revert the migration and delete its version marker.
    Down,
}

impl Direction {
    /// `true` when applying.
    pub fn is_up(&self) -> bool {
        matches!(self, Self::Up)
    }

    /// What happens to the version marker in this direction.
    pub fn marker_action(&self) -> &'static str {
        match self {
            Self::Up => "insert new",
            Self::Down => "delete",
        }
    }
}

impl From<bool> for Direction {
    fn from(up: bool) -> Self {
        if up { Self::Up } else { Self::Down }
    }
}

impl From<Direction> for bool {
    fn from(direction: Direction) -> Self {
        direction.is_up()
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
        }
    }
}

/// Flags for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionMode {
    /// Run everything inside one transaction.
    pub use_tx: bool,
    /// Apply or revert.
    pub direction: Direction,
    /// Skip the version marker mutation.
    pub no_versioning: bool,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        Self {
            use_tx: true,
            direction: Direction::Up,
            no_versioning: false,
        }
    }
}

impl ExecutionMode {
    /// Create a mode from the raw flags.
    pub fn new(use_tx: bool, direction: impl Into<Direction>, no_versioning: bool) -> Self {
        Self {
            use_tx,
            direction: direction.into(),
            no_versioning,
        }
    }

    /// Transactional, versioned apply.
    pub fn up() -> Self {
        Self::default()
    }

    /// Transactional, versioned revert.
    pub fn down() -> Self {
        Self::default().direction(Direction::Down)
    }

    /// Set whether to use a transaction.
    pub fn transactional(mut self, use_tx: bool) -> Self {
        self.use_tx = use_tx;
        self
    }

    /// Set the direction.
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Set whether to skip the version marker.
    pub fn no_versioning(mut self, no_versioning: bool) -> Self {
        self.no_versioning = no_versioning;
        self
    }
}

/// Executes statement groups and maintains version markers.
///
/// The runner holds no connection state. Each [`MigrationRunner::run`] call
/// borrows a [`Database`] for its duration; callers that run migrations
/// concurrently are responsible for serializing them.
#[derive(Debug, Clone)]
pub struct MigrationRunner<D> {
    dialect: D,
    watchdog: Watchdog,
    diagnostics: Diagnostics,
}

impl<D: Dialect> MigrationRunner<D> {
    /// Create a runner.
    pub fn new(dialect: D, config: &RunnerConfig) -> Self {
        Self {
            dialect,
            watchdog: Watchdog::from_config(config),
            diagnostics: Diagnostics::from_config(config),
        }
    }

    /// Create a runner with diagnostics off and default settings.
    pub fn quiet(dialect: D) -> Self {
        Self::new(dialect, &RunnerConfig::default())
    }

    /// The dialect providing version marker SQL.
    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    /// The watchdog wrapping every call.
    pub fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }

    /// Run `statements` for `version` under `mode`.
    ///
    /// Statements run strictly in order. The version marker, unless
    /// disabled, is written after the last statement; with `use_tx` the
    /// commit follows the marker.
    ///
    /// # Errors
    ///
    /// - [`RunError::TransactionStartFailed`] if `begin` fails; nothing ran.
    /// - [`RunError::StatementExecutionFailed`] for the first failing
    ///   statement; later statements are not attempted.
    /// - [`RunError::VersionRecordFailed`] if the marker mutation fails.
    /// - [`RunError::CommitFailed`] if the commit fails.
    ///
    /// In transactional mode the first three are preceded by a rollback. A
    /// rollback error is logged and discarded in favour of the original one.
    ///
    /// With `use_tx`, an empty group with `no_versioning` still begins and
    /// commits an empty transaction, so it can fail with
    /// [`RunError::TransactionStartFailed`] or [`RunError::CommitFailed`].
    #[instrument(
        skip_all,
        fields(version = version, direction = %mode.direction, use_tx = mode.use_tx)
    )]
    pub async fn run<DB, S>(
        &self,
        db: &DB,
        statements: &[S],
        version: i64,
        mode: ExecutionMode,
    ) -> RunResult<()>
    where
        DB: Database,
        S: AsRef<str> + Sync,
    {
        debug!(
            statements = statements.len(),
            no_versioning = mode.no_versioning,
            "Running migration"
        );

        if !mode.use_tx {
            return self.execute_group(db, statements, version, mode).await;
        }

        self.diagnostics.info("Begin transaction");
        let tx = db.begin().await.map_err(RunError::transaction_start)?;

        if let Err(err) = self.execute_group(&tx, statements, version, mode).await {
            self.diagnostics.info("Rollback transaction");
            if let Err(rollback_err) = tx.rollback().await {
                warn!(
                    error = %rollback_err,
                    original = %err,
                    "Rollback failed; reporting the original error"
                );
            }
            return Err(err);
        }

        self.diagnostics.info("Commit transaction");
        tx.commit().await.map_err(RunError::commit)?;

        debug!("Migration committed");
        Ok(())
    }

    /// Apply `statements` and insert the marker for `version`.
    pub async fn apply<DB, S>(
        &self,
        db: &DB,
        statements: &[S],
        version: i64,
        use_tx: bool,
    ) -> RunResult<()>
    where
        DB: Database,
        S: AsRef<str> + Sync,
    {
        let mode = ExecutionMode::up().transactional(use_tx);
        self.run(db, statements, version, mode).await
    }

    /// Revert with `statements` and delete the marker for `version`.
    pub async fn revert<DB, S>(
        &self,
        db: &DB,
        statements: &[S],
        version: i64,
        use_tx: bool,
    ) -> RunResult<()>
    where
        DB: Database,
        S: AsRef<str> + Sync,
    {
        let mode = ExecutionMode::down().transactional(use_tx);
        self.run(db, statements, version, mode).await
    }

    /// Run every statement, then the marker mutation, against one handle.
    async fn execute_group<E, S>(
        &self,
        exec: &E,
        statements: &[S],
        version: i64,
        mode: ExecutionMode,
    ) -> RunResult<()>
    where
        E: StatementExecutor,
        S: AsRef<str> + Sync,
    {
        for query in statements {
            let query = query.as_ref();
            if self.diagnostics.is_enabled() {
                self.diagnostics
                    .info(format_args!("Executing statement: {}", sanitize(query)));
            }

            self.watchdog
                .watch(exec, query, &[])
                .await
                .map_err(|e| RunError::statement(sanitize(query), e))?;
        }

        if mode.no_versioning {
            return Ok(());
        }

        let (sql, args) = match mode.direction {
            Direction::Up => (
                self.dialect.insert_version_sql(),
                vec![Value::Int(version), Value::Bool(true)],
            ),
            Direction::Down => (self.dialect.delete_version_sql(), vec![Value::Int(version)]),
        };

        self.watchdog
            .watch(exec, &sql, &args)
            .await
            .map_err(|e| RunError::version_record(mode.direction, e))
    }
}
