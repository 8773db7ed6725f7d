//! SQLite connector used by the integration tests.
//!
//! Backed by a database file so that rows survive a connection reset.
use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};

use super::connection::RecordWriter;
use super::failure::WriteFailure;
use super::schema::{SQLITE_CREATE_TABLE_SQL, SQLITE_INSERT_SQL};
use crate::generator::Record;

pub struct SqliteConnector {
    path: PathBuf,
}

impl SqliteConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Open a separate connection, e.g. to inspect what the probe wrote
    pub async fn open(&self) -> Result<SqliteConnection, sqlx::Error> {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .connect()
            .await
    }
}

impl bb8::ManageConnection for SqliteConnector {
    type Connection = SqliteConnection;
    type Error = WriteFailure;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        Ok(self.open().await?)
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.ping().await?;
        Ok(())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

#[async_trait]
impl RecordWriter for SqliteConnection {
    async fn insert_record(&mut self, record: &Record) -> Result<(), WriteFailure> {
        sqlx::query(SQLITE_INSERT_SQL)
            .bind(record.description())
            .bind(record.status())
            .execute(&mut *self)
            .await?;
        Ok(())
    }

    async fn create_table(&mut self) -> Result<(), WriteFailure> {
        sqlx::query(SQLITE_CREATE_TABLE_SQL)
            .execute(&mut *self)
            .await?;
        Ok(())
    }
}
