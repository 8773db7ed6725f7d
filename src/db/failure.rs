//! Classification of failed write attempts

use std::fmt;

use thiserror::Error;

/// SQLSTATE raised when a write reaches a session that can no longer accept
/// writes, e.g. a former primary demoted to a replica during failover.
pub const READ_ONLY_SQL_TRANSACTION: &str = "25006";

/// Failure category of a single write attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The session is attached to a read-only endpoint. The connection is
    /// poisoned and must be rebuilt before retrying.
    ReadOnly,
    /// Network, TLS or protocol level failure, or no live connection
    Connection,
    /// The statement or the connect call did not finish in time
    Timeout,
    /// Any other error reported by the database
    Statement,
}

impl FailureKind {
    /// Only the read-only class warrants tearing the connection down.
    pub fn requires_reset(self) -> bool {
        matches!(self, FailureKind::ReadOnly)
    }

    /// The session itself may be gone; check it before the next attempt.
    pub fn requires_revalidation(self) -> bool {
        matches!(self, FailureKind::Connection | FailureKind::Timeout)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::ReadOnly => write!(f, "read_only"),
            FailureKind::Connection => write!(f, "connection"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Statement => write!(f, "statement"),
        }
    }
}

/// Error of one write, connect or ping attempt
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct WriteFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl WriteFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_connected() -> Self {
        Self::new(FailureKind::Connection, "no live database connection")
    }

    pub fn timed_out(what: &str, after: std::time::Duration) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!("{what} timed out after {}s", after.as_secs()),
        )
    }
}

impl From<sqlx::Error> for WriteFailure {
    fn from(error: sqlx::Error) -> Self {
        let kind = classify(&error);
        let message = match &error {
            sqlx::Error::Database(db_error) => match db_error.code() {
                Some(code) => format!("{} (SQLSTATE {code})", db_error.message()),
                None => db_error.message().to_string(),
            },
            other => other.to_string(),
        };
        Self { kind, message }
    }
}

/// Map a driver error to its failure category
pub fn classify(error: &sqlx::Error) -> FailureKind {
    match error {
        sqlx::Error::Database(db_error) => match db_error.code().as_deref() {
            Some(READ_ONLY_SQL_TRANSACTION) => FailureKind::ReadOnly,
            _ => FailureKind::Statement,
        },
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => FailureKind::Connection,
        sqlx::Error::PoolTimedOut => FailureKind::Timeout,
        _ => FailureKind::Statement,
    }
}
