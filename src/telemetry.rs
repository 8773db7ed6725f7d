use std::time::Duration;

/// Events emitted by the write path for run statistics
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    /// A logical write finished, possibly after retries
    WriteCompleted { attempts: u32, duration_ms: u64 },
    /// A failure streak ended with a successful write
    Recovered { downtime_ms: u64 },
    /// The connection was rebuilt after a read-only failure
    Reconnected,
}

/// Statistics aggregated from telemetry events
#[derive(Debug, Default, Clone)]
pub struct ProbeStats {
    pub records_written: u64,
    pub total_attempts: u64,
    pub reconnects: u64,
    pub downtimes_ms: Vec<u64>,
    pub write_durations_ms: Vec<u64>,
}

impl ProbeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats with a telemetry event
    pub fn update(&mut self, event: &TelemetryEvent) {
        match event {
            TelemetryEvent::WriteCompleted {
                attempts,
                duration_ms,
            } => {
                self.records_written += 1;
                self.total_attempts += u64::from(*attempts);
                self.write_durations_ms.push(*duration_ms);
            }
            TelemetryEvent::Recovered { downtime_ms } => {
                self.downtimes_ms.push(*downtime_ms);
            }
            TelemetryEvent::Reconnected => {
                self.reconnects += 1;
            }
        }
    }

    /// Calculate percentile from write durations
    pub fn percentile(&self, p: f64) -> Option<u64> {
        if self.write_durations_ms.is_empty() {
            return None;
        }

        let mut sorted = self.write_durations_ms.clone();
        sorted.sort_unstable();

        let index = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
        let index = index.saturating_sub(1).min(sorted.len() - 1);

        Some(sorted[index])
    }

    /// Get p50, p90, p99 percentiles
    pub fn get_percentiles(&self) -> (Option<u64>, Option<u64>, Option<u64>) {
        (
            self.percentile(50.0),
            self.percentile(90.0),
            self.percentile(99.0),
        )
    }

    /// Longest observed outage, if any write had to recover
    pub fn max_downtime(&self) -> Option<Duration> {
        self.downtimes_ms
            .iter()
            .max()
            .map(|ms| Duration::from_millis(*ms))
    }
}
