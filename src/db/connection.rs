//! Single-connection manager over a `bb8::ManageConnection` connector.
//!
//! All writes go through exactly one session, so a failover surfaces as errors
//! on that session rather than being absorbed by a pool.
use async_trait::async_trait;
use bb8::ManageConnection;
use tracing::{info, warn};

use super::failure::WriteFailure;
use crate::error::ProbeError;
use crate::generator::Record;

/// Write operations the probe needs from a live connection
#[async_trait]
pub trait RecordWriter: Send {
    /// Insert one record into the probe table
    async fn insert_record(&mut self, record: &Record) -> Result<(), WriteFailure>;

    /// Create the probe table if it does not exist yet
    async fn create_table(&mut self) -> Result<(), WriteFailure>;
}

/// Owns the one live connection handle.
///
/// The handle is either usable or absent. `reset` replaces it wholesale; every
/// successful (re)connect bumps the generation so callers can tell whether the
/// handle they wrote through is still the same one.
pub struct ConnectionManager<M: ManageConnection> {
    connector: M,
    conn: Option<M::Connection>,
    generation: u64,
}

impl<M> ConnectionManager<M>
where
    M: ManageConnection,
    M::Connection: RecordWriter,
    WriteFailure: From<M::Error>,
{
    /// Establish the initial connection and verify it with a ping.
    ///
    /// Failure here is terminal: without a database the probe has nothing to do.
    pub async fn connect(connector: M) -> Result<Self, ProbeError> {
        let mut manager = Self {
            connector,
            conn: None,
            generation: 0,
        };
        manager.establish().await.map_err(ProbeError::Connect)?;
        info!("Successfully connected to the database");
        Ok(manager)
    }

    /// Tear down the current handle (if any) and connect again.
    ///
    /// On failure the handle stays absent; the next write attempt will try to
    /// connect before writing.
    pub async fn reset(&mut self) -> Result<(), WriteFailure> {
        if self.conn.take().is_some() {
            info!(generation = self.generation, "closed database connection");
        }
        match self.establish().await {
            Ok(()) => {
                info!(generation = self.generation, "reconnected to the database");
                Ok(())
            }
            Err(e) => {
                warn!(kind = %e.kind, "reconnect failed: {}", e);
                Err(e)
            }
        }
    }

    /// The live handle, connecting first when it is absent.
    pub async fn connection(&mut self) -> Result<&mut M::Connection, WriteFailure> {
        if self.conn.is_none() {
            self.establish().await?;
            info!(generation = self.generation, "reconnected to the database");
        }
        self.conn.as_mut().ok_or_else(WriteFailure::not_connected)
    }

    /// Ping the live handle and quietly replace it if the session is gone.
    ///
    /// A handle that still answers is kept as is. Returns whether the handle
    /// was replaced. If the replacement cannot connect the handle stays
    /// absent and the next `connection` call retries.
    pub async fn revalidate(&mut self) -> bool {
        let Some(conn) = self.conn.as_mut() else {
            return false;
        };
        if self.connector.is_valid(conn).await.is_ok() && !self.connector.has_broken(conn) {
            return false;
        }

        self.conn = None;
        warn!(generation = self.generation, "database session lost");
        match self.establish().await {
            Ok(()) => {
                info!(generation = self.generation, "replaced lost database session");
                true
            }
            Err(e) => {
                warn!(kind = %e.kind, "reconnect failed: {}", e);
                false
            }
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Identity of the current handle; incremented on every successful connect
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Open a connection and ping it before making it the live handle
    async fn establish(&mut self) -> Result<(), WriteFailure> {
        let mut conn = self.connector.connect().await?;
        self.connector.is_valid(&mut conn).await?;
        if self.connector.has_broken(&mut conn) {
            return Err(WriteFailure::not_connected());
        }
        self.conn = Some(conn);
        self.generation += 1;
        Ok(())
    }
}
