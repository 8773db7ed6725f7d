//! PostgreSQL connector for the probe's single connection.
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection};

use super::connection::RecordWriter;
use super::failure::WriteFailure;
use super::schema::{CREATE_TABLE_SQL, INSERT_SQL};
use crate::config::{CONNECT_TIMEOUT, PING_TIMEOUT};
use crate::generator::Record;

/// Opens sessions against the configured DSN.
pub struct PgConnector {
    connect_options: PgConnectOptions,
}

impl PgConnector {
    pub fn new(connect_options: PgConnectOptions) -> Self {
        Self { connect_options }
    }
}

impl bb8::ManageConnection for PgConnector {
    type Connection = PgConnection;
    type Error = WriteFailure;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        tracing::debug!(host = self.connect_options.get_host(), "connecting");
        let conn = tokio::time::timeout(CONNECT_TIMEOUT, self.connect_options.connect())
            .await
            .map_err(|_| WriteFailure::timed_out("connect", CONNECT_TIMEOUT))??;
        Ok(conn)
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        tokio::time::timeout(PING_TIMEOUT, conn.ping())
            .await
            .map_err(|_| WriteFailure::timed_out("ping", PING_TIMEOUT))??;
        Ok(())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        // sqlx::PgConnection provides no non-async way to check for closed/broken connections.
        false
    }
}

#[async_trait]
impl RecordWriter for PgConnection {
    async fn insert_record(&mut self, record: &Record) -> Result<(), WriteFailure> {
        sqlx::query(INSERT_SQL)
            .bind(record.description())
            .bind(record.status())
            .execute(&mut *self)
            .await?;
        Ok(())
    }

    async fn create_table(&mut self) -> Result<(), WriteFailure> {
        sqlx::query(CREATE_TABLE_SQL).execute(&mut *self).await?;
        Ok(())
    }
}
