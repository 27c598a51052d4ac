//! Error types for migration runs.

use thiserror::Error;

use crate::runner::Direction;

/// Boxed backend error carried as the cause of a [`RunError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for migration runs.
pub type RunResult<T> = Result<T, RunError>;

/// Phase of a run in which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Opening the transaction.
    Begin,
    /// Executing a migration statement.
    Statement,
    /// Inserting or deleting the version marker.
    Version,
    /// Committing the transaction.
    Commit,
}

/// Errors that terminate a migration run.
///
/// None of these are retried. When a transactional run fails after the
/// transaction was opened, a rollback is attempted first; an error from that
/// rollback is logged and dropped so the original failure is the one
/// reported.
#[derive(Debug, Error)]
pub enum RunError {
    /// The transaction could not be started. No statement ran.
    #[error("failed to begin transaction: {cause}")]
    TransactionStartFailed {
        /// Backend error.
        #[source]
        cause: BoxError,
    },

    /// A migration statement failed.
    #[error("failed to execute SQL query {statement:?}: {cause}")]
    StatementExecutionFailed {
        /// Sanitized text of the failing statement.
        statement: String,
        /// Backend error.
        #[source]
        cause: BoxError,
    },

    /// Inserting or deleting the version marker failed.
    #[error("failed to {} version: {cause}", .direction.marker_action())]
    VersionRecordFailed {
        /// Direction of the run, which decides insert vs delete.
        direction: Direction,
        /// Backend error.
        #[source]
        cause: BoxError,
    },

    /// Commit failed. The caller must not assume partial application.
    #[error("failed to commit transaction: {cause}")]
    CommitFailed {
        /// Backend error.
        #[source]
        cause: BoxError,
    },
}

impl RunError {
    /// Create a transaction start error.
    pub fn transaction_start(cause: impl Into<BoxError>) -> Self {
        Self::TransactionStartFailed {
            cause: cause.into(),
        }
    }

    /// Create a statement execution error.
    pub fn statement(statement: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::StatementExecutionFailed {
            statement: statement.into(),
            cause: cause.into(),
        }
    }

    /// Create a version record error.
    pub fn version_record(direction: Direction, cause: impl Into<BoxError>) -> Self {
        Self::VersionRecordFailed {
            direction,
            cause: cause.into(),
        }
    }

    /// Create a commit error.
    pub fn commit(cause: impl Into<BoxError>) -> Self {
        Self::CommitFailed {
            cause: cause.into(),
        }
    }

    /// Phase in which the run failed.
    pub fn phase(&self) -> RunPhase {
        match self {
            Self::TransactionStartFailed { .. } => RunPhase::Begin,
            Self::StatementExecutionFailed { .. } => RunPhase::Statement,
            Self::VersionRecordFailed { .. } => RunPhase::Version,
            Self::CommitFailed { .. } => RunPhase::Commit,
        }
    }

    /// The underlying backend error.
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        match self {
            Self::TransactionStartFailed { cause }
            | Self::StatementExecutionFailed { cause, .. }
            | Self::VersionRecordFailed { cause, .. }
            | Self::CommitFailed { cause } => cause.as_ref(),
        }
    }

    /// Sanitized statement text, for statement failures.
    pub fn statement_text(&self) -> Option<&str> {
        match self {
            Self::StatementExecutionFailed { statement, .. } => Some(statement),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn io(msg: &str) -> std::io::Error {
        std::io::Error::other(msg.to_string())
    }

    #[test]
    fn test_statement_error_display() {
        let err = RunError::statement("INSERT INTO t VALUES(1);", io("no such table: t"));
        let msg = err.to_string();
        assert!(msg.contains("INSERT INTO t VALUES(1);"));
        assert!(msg.contains("no such table"));
        assert_eq!(err.statement_text(), Some("INSERT INTO t VALUES(1);"));
        assert_eq!(err.phase(), RunPhase::Statement);
    }

    #[test]
    fn test_version_record_display() {
        let up = RunError::version_record(Direction::Up, io("duplicate"));
        assert!(up.to_string().starts_with("failed to insert new version"));

        let down = RunError::version_record(Direction::Down, io("locked"));
        assert!(down.to_string().starts_with("failed to delete version"));
        assert_eq!(down.phase(), RunPhase::Version);
    }

    #[test]
    fn test_source_is_cause() {
        let err = RunError::commit(io("disk full"));
        assert_eq!(err.source().map(|e| e.to_string()), Some("disk full".into()));
        assert_eq!(err.cause().to_string(), "disk full");
        assert!(err.statement_text().is_none());
    }
}
