use std::fmt;
use std::time::Duration;

use bb8::ManageConnection;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::rngs::StdRng;
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use super::writer::WriteRetryLoop;
use crate::db::{ConnectionManager, RecordWriter, WriteFailure};
use crate::error::ProbeError;
use crate::generator::RecordGenerator;
use crate::telemetry::{ProbeStats, TelemetryEvent};

/// Pacing of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Back-to-back writes
    Burst,
    /// One write every `1000 / rps` milliseconds, not counting the write itself
    RateLimited { rps: u32 },
}

impl RunMode {
    pub fn rate_limited(rps: u32) -> Result<Self, ProbeError> {
        if rps == 0 {
            return Err(ProbeError::InvalidConfig(
                "rps must be greater than 0 for a rate-limited run".to_string(),
            ));
        }
        Ok(RunMode::RateLimited { rps })
    }

    /// Delay inserted between two consecutive logical writes
    pub fn inter_record_delay(&self) -> Option<Duration> {
        match self {
            RunMode::Burst => None,
            RunMode::RateLimited { rps } => Some(Duration::from_millis(1000) / *rps),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Burst => write!(f, "burst"),
            RunMode::RateLimited { rps } => write!(f, "rate-limited ({rps} rps)"),
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration: Duration,
    pub stats: ProbeStats,
}

impl RunReport {
    pub fn records_written(&self) -> u64 {
        self.stats.records_written
    }

    /// Outage measurements, one per recovered failure streak
    pub fn downtimes(&self) -> Vec<Duration> {
        self.stats
            .downtimes_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }
}

/// Drives a fixed number of logical writes, one at a time.
pub struct RunController<M: ManageConnection, R = StdRng> {
    connections: ConnectionManager<M>,
    writer: WriteRetryLoop,
    generator: RecordGenerator<R>,
}

impl<M, R> RunController<M, R>
where
    M: ManageConnection,
    M::Connection: RecordWriter,
    WriteFailure: From<M::Error>,
    R: Rng,
{
    pub fn new(
        connections: ConnectionManager<M>,
        writer: WriteRetryLoop,
        generator: RecordGenerator<R>,
    ) -> Self {
        Self {
            connections,
            writer,
            generator,
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn connections(&self) -> &ConnectionManager<M> {
        &self.connections
    }

    /// Write `record_count` records in the given mode.
    ///
    /// Record `i + 1` is only generated once record `i` has landed, including
    /// all of its retries. An exhausted retry budget ends the run immediately.
    pub async fn run(&mut self, mode: RunMode, record_count: u64) -> Result<RunReport, ProbeError> {
        let run_id = Uuid::new_v4().to_string();
        info!("==============");
        match mode {
            RunMode::Burst => info!(run_id, "Start Dummy Data Generator"),
            RunMode::RateLimited { rps } => {
                info!(run_id, "Start Write Data Simulation at {} RPS", rps)
            }
        }

        let started_at = Utc::now();
        let start = Instant::now();
        info!("Start time: {}", started_at.to_rfc3339());

        let delay = mode.inter_record_delay();
        let mut stats = ProbeStats::new();

        for i in 0..record_count {
            let record = self.generator.next_record();
            let write_start = Instant::now();
            let outcome = self.writer.write(&mut self.connections, &record).await?;

            stats.update(&TelemetryEvent::WriteCompleted {
                attempts: outcome.attempts,
                duration_ms: write_start.elapsed().as_millis() as u64,
            });
            for _ in 0..outcome.reconnects {
                stats.update(&TelemetryEvent::Reconnected);
            }
            if let Some(downtime) = outcome.downtime {
                stats.update(&TelemetryEvent::Recovered {
                    downtime_ms: downtime.as_millis() as u64,
                });
            }

            if let Some(delay) = delay
                && i + 1 < record_count
            {
                tokio::time::sleep(delay).await;
            }
        }

        let duration = start.elapsed();
        let finished_at = Utc::now();
        info!("End time: {}", finished_at.to_rfc3339());
        info!("Duration: {:?}", duration);

        let (p50, p90, p99) = stats.get_percentiles();
        info!(
            records = stats.records_written,
            attempts = stats.total_attempts,
            reconnects = stats.reconnects,
            recoveries = stats.downtimes_ms.len(),
            max_downtime_ms = stats.max_downtime().map(|d| d.as_millis() as u64),
            p50_ms = p50,
            p90_ms = p90,
            p99_ms = p99,
            "Run complete"
        );

        Ok(RunReport {
            run_id,
            mode,
            started_at,
            finished_at,
            duration,
            stats,
        })
    }
}
