use std::time::Duration;

use bb8::ManageConnection;
use derive_builder::Builder;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::config::QUERY_TIMEOUT;
use crate::db::{ConnectionManager, RecordWriter, WriteFailure};
use crate::error::ProbeError;
use crate::generator::Record;

/// Retry budget and pacing of a single logical write
#[derive(Debug, Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct RetryPolicy {
    /// Attempts allowed per logical write, the first one included
    pub max_retry: u32,
    /// Fixed delay between two attempts
    #[builder(default = "Duration::from_secs(1)")]
    pub backoff: Duration,
    /// Upper bound on a single INSERT
    #[builder(default = "QUERY_TIMEOUT")]
    pub query_timeout: Duration,
}

impl RetryPolicyBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.max_retry {
            Some(0) => Err("max_retry must be at least 1".to_string()),
            _ => Ok(()),
        }
    }
}

/// Result of a logical write that eventually succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Attempts used, the successful one included
    pub attempts: u32,
    /// Time from the first failure of the streak to the successful attempt
    pub downtime: Option<Duration>,
    /// Connection resets performed during the streak
    pub reconnects: u32,
}

/// Per-write retry bookkeeping
#[derive(Debug)]
struct RetryState {
    retry_count: u32,
    first_failure: Option<Instant>,
}

impl RetryState {
    fn new() -> Self {
        Self {
            retry_count: 1,
            first_failure: None,
        }
    }

    fn record_failure(&mut self, now: Instant) {
        if self.retry_count == 1 {
            self.first_failure = Some(now);
        }
    }

    fn downtime(&self, now: Instant) -> Option<Duration> {
        if self.retry_count > 1 {
            self.first_failure.map(|started| now.duration_since(started))
        } else {
            None
        }
    }
}

/// Writes one record, retrying until it lands or the budget is spent.
///
/// Failures of the read-only class poison the connection: it is reset before
/// the next attempt. After a connection or timeout failure the session is
/// pinged and replaced only if it is gone; that replacement is not counted as
/// a reset. Statement failures are retried on the same connection.
/// The same record is re-sent on every attempt, so a write that committed
/// server-side before its error was observed can produce a duplicate row.
pub struct WriteRetryLoop {
    policy: RetryPolicy,
}

impl WriteRetryLoop {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub async fn write<M>(
        &self,
        connections: &mut ConnectionManager<M>,
        record: &Record,
    ) -> Result<WriteOutcome, ProbeError>
    where
        M: ManageConnection,
        M::Connection: RecordWriter,
        WriteFailure: From<M::Error>,
    {
        let mut state = RetryState::new();
        let mut reconnects = 0;

        loop {
            match self.attempt(connections, record).await {
                Ok(()) => {
                    let downtime = state.downtime(Instant::now());
                    if let Some(downtime) = downtime {
                        info!(
                            downtime_ms = downtime.as_millis() as u64,
                            attempts = state.retry_count,
                            "DownTime: {}ms",
                            downtime.as_millis()
                        );
                    }
                    info!("Insert: {} success", record.description());
                    return Ok(WriteOutcome {
                        attempts: state.retry_count,
                        downtime,
                        reconnects,
                    });
                }
                Err(failure) => {
                    state.record_failure(Instant::now());

                    if state.retry_count >= self.policy.max_retry {
                        error!(
                            kind = %failure.kind,
                            "Failed to insert data: {}. Error: [{}]",
                            record.description(),
                            failure
                        );
                        return Err(ProbeError::RetriesExhausted {
                            record: record.description().to_string(),
                            attempts: state.retry_count,
                            source: failure,
                        });
                    }

                    warn!(
                        kind = %failure.kind,
                        "Failed to insert: {}. Error: [{}]. Retrying ({}/{})...",
                        record.description(),
                        failure,
                        state.retry_count,
                        self.policy.max_retry
                    );

                    if failure.kind.requires_reset() {
                        warn!("write target is read-only, resetting connection");
                        if connections.reset().await.is_ok() {
                            reconnects += 1;
                        }
                    } else if failure.kind.requires_revalidation() {
                        connections.revalidate().await;
                    }

                    tokio::time::sleep(self.policy.backoff).await;
                    state.retry_count += 1;
                }
            }
        }
    }

    /// One INSERT on the live handle, connecting first if there is none
    async fn attempt<M>(
        &self,
        connections: &mut ConnectionManager<M>,
        record: &Record,
    ) -> Result<(), WriteFailure>
    where
        M: ManageConnection,
        M::Connection: RecordWriter,
        WriteFailure: From<M::Error>,
    {
        let conn = connections.connection().await?;
        tokio::time::timeout(self.policy.query_timeout, conn.insert_record(record))
            .await
            .map_err(|_| WriteFailure::timed_out("insert", self.policy.query_timeout))?
    }
}
