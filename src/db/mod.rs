//! Database layer - single connection management, failure classification and schema

pub mod connection;
pub mod failure;
pub mod postgres;
pub mod schema;

#[cfg(test)]
pub mod scripted;
#[cfg(test)]
pub mod sqlite;

pub use connection::{ConnectionManager, RecordWriter};
pub use failure::{FailureKind, WriteFailure};
pub use postgres::PgConnector;
