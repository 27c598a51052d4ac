//! Connection and transaction contracts consumed by the runner.
//!
//! The runner never talks to a driver directly. It needs three things from a
//! backend:
//!
//! - something that executes one parameterized statement ([`StatementExecutor`])
//! - a way to open a transaction from a plain connection ([`Database`])
//! - commit and rollback on that transaction ([`Transaction`])
//!
//! Both the plain connection and the transaction are [`StatementExecutor`]s
//! with identical signatures, so statement execution is written once and runs
//! against either handle.
//!
//! Executors are `Clone + 'static` because the watchdog moves a handle into a
//! spawned task while it reports progress. Driver handles are usually cheap
//! to clone (an `Arc` or a channel sender).

use std::fmt;

/// A positional statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit integer.
    Int(i64),
    /// Text value.
    Text(String),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Text(s) => write!(f, "'{}'", s),
        }
    }
}

/// Executes a single parameterized statement.
#[async_trait::async_trait]
pub trait StatementExecutor: Clone + Send + Sync + 'static {
    /// Error returned by the backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Execute `sql` with positional `args`.
    async fn execute(&self, sql: &str, args: &[Value]) -> Result<(), Self::Error>;
}

/// A plain connection that can open transactions.
#[async_trait::async_trait]
pub trait Database: StatementExecutor {
    /// Transaction handle produced by [`Database::begin`].
    type Transaction: Transaction<Error = Self::Error>;

    /// Start a transaction.
    async fn begin(&self) -> Result<Self::Transaction, Self::Error>;
}

/// An open transaction.
#[async_trait::async_trait]
pub trait Transaction: StatementExecutor {
    /// Commit everything executed through this handle.
    async fn commit(self) -> Result<(), Self::Error>;

    /// Discard everything executed through this handle.
    async fn rollback(self) -> Result<(), Self::Error>;
}
