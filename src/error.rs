use std::path::PathBuf;

use thiserror::Error;

use crate::db::WriteFailure;

/// Terminal conditions of the probe
///
/// Every variant ends the current operation. Transient write failures never
/// show up here; they are absorbed by the retry loop until the attempt budget
/// runs out, at which point they become [`ProbeError::RetriesExhausted`].
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to read config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to connect to the database: {0}")]
    Connect(#[source] WriteFailure),

    #[error("failed to insert data: {record} after {attempts} attempts. Error: [{source}]")]
    RetriesExhausted {
        record: String,
        attempts: u32,
        #[source]
        source: WriteFailure,
    },

    #[error("failed to create table: {0}")]
    Schema(#[source] WriteFailure),
}
